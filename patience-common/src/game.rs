use crate::card::{Card, Deck, TOTAL_SUITS};
use crate::moves::Move;

use anyhow::{Context, Result, bail};
use smallvec::SmallVec;

pub const TOTAL_FOUNDATIONS: usize = TOTAL_SUITS as usize;
/// Largest tableau width whose deal triangle fits in one deck.
pub const MAX_TABLEAU_SIZE: usize = 9;
const TALON_SIZE: usize = 24;

/// Ruleset shared immutably by every game built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    /// Cards moved to the waste per draw.
    pub draw_count: usize,
    /// Number of tableau columns.
    pub tableau_size: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            draw_count: 3,
            tableau_size: 7,
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<()> {
        if self.draw_count < 1 {
            bail!("Draw count must be at least 1.");
        }
        if !(1..=MAX_TABLEAU_SIZE).contains(&self.tableau_size) {
            bail!("Tableau size must be between 1 and {MAX_TABLEAU_SIZE}.");
        }
        Ok(())
    }

    /// Cards consumed by the opening deal.
    pub fn triangle_size(&self) -> usize {
        self.tableau_size * (self.tableau_size + 1) / 2
    }
}

/// One tableau column: a face-down stack that is never reordered, and the
/// face-up run on top of it. Within `face_up`, ranks descend by one and
/// colors alternate; `apply` maintains this, nothing re-checks it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tableau {
    pub face_down: SmallVec<[Card; 8]>,
    pub face_up: SmallVec<[Card; 13]>,
}

impl Tableau {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.face_down.is_empty() && self.face_up.is_empty()
    }

    /// Whether `card` (with any run above it) may land on this column.
    #[inline]
    pub fn accepts(&self, card: Card) -> bool {
        match self.face_up.last() {
            Some(&top) => card.fits_under(top),
            None => card.is_king(),
        }
    }

    /// ASCII concatenation of the face-up run, bottom to top.
    pub fn face_up_code(&self) -> String {
        let mut code = String::with_capacity(self.face_up.len() * 2);
        for card in &self.face_up {
            card.write_code(&mut code);
        }
        code
    }
}

/// A mutable Klondike position: stock (hand), waste, per-suit foundations
/// and the tableau columns. The stock and waste store their top card last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub rules: Rules,
    pub stock: SmallVec<[Card; TALON_SIZE]>,
    pub waste: SmallVec<[Card; TALON_SIZE]>,
    /// Highest rank placed per suit, or -1 when the pile is empty.
    pub foundations: [i8; TOTAL_FOUNDATIONS],
    pub tableaus: Vec<Tableau>,
}

impl Game {
    /// Deal a fresh game. Column k takes k face-down cards under one face-up
    /// card, consumed from the tail of the deck line; the remaining prefix
    /// becomes the stock with line position 0 on top.
    pub fn new(rules: Rules, deck: &Deck) -> Self {
        assert!(rules.validate().is_ok(), "Rules must be validated first");
        let mut cards = deck.cards().to_vec();
        let mut tableaus = vec![Tableau::default(); rules.tableau_size];
        for (index, tableau) in tableaus.iter_mut().enumerate() {
            let mut dealt = cards.split_off(cards.len() - (index + 1));
            if let Some(up) = dealt.pop() {
                tableau.face_up.push(up);
            }
            tableau.face_down.extend(dealt);
        }
        cards.reverse();
        Game {
            rules,
            stock: SmallVec::from_vec(cards),
            waste: SmallVec::new(),
            foundations: [-1; TOTAL_FOUNDATIONS],
            tableaus,
        }
    }

    /// Whether `mv` is legal here. Never mutates.
    pub fn is_valid(&self, mv: Move) -> bool {
        match mv {
            Move::Draw => !self.stock.is_empty() || !self.waste.is_empty(),
            Move::WasteToFoundation => match self.waste.last() {
                Some(card) => self.foundation_accepts(*card),
                None => false,
            },
            Move::WasteToTableau(dst) => {
                match (self.waste.last(), self.tableaus.get(dst as usize)) {
                    (Some(&card), Some(tableau)) => tableau.accepts(card),
                    _ => false,
                }
            }
            Move::TableauToFoundation(src) => {
                match self.tableaus.get(src as usize).and_then(|t| t.face_up.last()) {
                    Some(card) => self.foundation_accepts(*card),
                    None => false,
                }
            }
            Move::TableauToTableau { src, row, dst } => {
                if src == dst {
                    return false;
                }
                let (Some(src_tableau), Some(dst_tableau)) =
                    (self.tableaus.get(src as usize), self.tableaus.get(dst as usize))
                else {
                    return false;
                };
                match src_tableau.face_up.get(row as usize) {
                    Some(&card) => dst_tableau.accepts(card),
                    None => false,
                }
            }
            Move::FoundationToTableau { suit, dst } => {
                let Some(&height) = self.foundations.get(suit as usize) else {
                    return false;
                };
                if height < 0 {
                    return false;
                }
                let card = Card::new(height as u8, suit);
                match self.tableaus.get(dst as usize) {
                    Some(tableau) => !tableau.is_empty() && tableau.accepts(card),
                    None => false,
                }
            }
        }
    }

    /// Apply a pre-validated move in place.
    pub fn apply(&mut self, mv: Move) {
        match mv {
            Move::Draw => {
                if self.stock.is_empty() {
                    while let Some(card) = self.waste.pop() {
                        self.stock.push(card);
                    }
                }
                for _ in 0..self.rules.draw_count {
                    match self.stock.pop() {
                        Some(card) => self.waste.push(card),
                        None => break,
                    }
                }
            }
            Move::WasteToFoundation => {
                if let Some(card) = self.waste.pop() {
                    self.foundations[card.suit() as usize] += 1;
                }
            }
            Move::WasteToTableau(dst) => {
                if let Some(card) = self.waste.pop() {
                    self.tableaus[dst as usize].face_up.push(card);
                }
            }
            Move::TableauToFoundation(src) => {
                if let Some(card) = self.tableaus[src as usize].face_up.pop() {
                    self.foundations[card.suit() as usize] += 1;
                }
            }
            Move::TableauToTableau { src, row, dst } => {
                let moved: SmallVec<[Card; 13]> =
                    self.tableaus[src as usize].face_up.drain(row as usize..).collect();
                self.tableaus[dst as usize].face_up.extend(moved);
            }
            Move::FoundationToTableau { suit, dst } => {
                let height = self.foundations[suit as usize];
                if height >= 0 {
                    self.tableaus[dst as usize].face_up.push(Card::new(height as u8, suit));
                    self.foundations[suit as usize] -= 1;
                }
            }
        }
        self.flip_exposed();
    }

    /// Turn up the top face-down card of any column whose face-up run is
    /// gone. Runs once per column per applied move.
    fn flip_exposed(&mut self) {
        for tableau in &mut self.tableaus {
            if tableau.face_up.is_empty()
                && let Some(card) = tableau.face_down.pop()
            {
                tableau.face_up.push(card);
            }
        }
    }

    /// Won as soon as nothing is hidden: empty stock, waste and face-down
    /// stacks. Remaining face-up play is trivially reducible to foundation
    /// plays.
    pub fn is_won(&self) -> bool {
        self.stock.is_empty()
            && self.waste.is_empty()
            && self.tableaus.iter().all(|t| t.face_down.is_empty())
    }

    #[inline]
    fn foundation_accepts(&self, card: Card) -> bool {
        self.foundations[card.suit() as usize] + 1 == card.rank() as i8
    }

    /// Compact key identifying this position's search-equivalence class.
    ///
    /// Joins, with `|`: the deck-flip permission, the waste top, the set of
    /// draw cards reachable without playing from the waste, the foundation
    /// heights, and the per-column strings sorted so that interchangeable
    /// columns relabel to the same key.
    pub fn canonical_id(&self, can_flip_deck: bool) -> String {
        let mut key = String::with_capacity(96);
        key.push(if can_flip_deck { '1' } else { '0' });
        key.push('|');

        if let Some(top) = self.waste.last() {
            top.write_code(&mut key);
        }
        key.push('|');

        // The draw sequence as it would exist after flipping the waste back:
        // stepping back from the end by draw_count lands on every future
        // waste top, plus the deepest card and the current top.
        let mut new_deck: SmallVec<[Card; 64]> = self.waste.iter().rev().copied().collect();
        new_deck.extend(self.stock.iter().copied());
        let mut accessible: SmallVec<[Card; TALON_SIZE]> = SmallVec::new();
        let draw = self.rules.draw_count as isize;
        let mut i = new_deck.len() as isize - draw;
        while i >= 0 {
            let card = new_deck[i as usize];
            if !accessible.contains(&card) {
                accessible.push(card);
            }
            i -= draw;
        }
        if let Some(&first) = new_deck.first()
            && !accessible.contains(&first)
        {
            accessible.push(first);
        }
        if let Some(&top) = self.waste.last()
            && !accessible.contains(&top)
        {
            accessible.push(top);
        }
        for card in &accessible {
            card.write_code(&mut key);
        }
        key.push('|');

        for (suit, height) in self.foundations.iter().enumerate() {
            if suit > 0 {
                key.push(',');
            }
            key.push_str(&(height + 1).to_string());
        }
        key.push('|');

        // Columns without hidden cards are interchangeable; ones with hidden
        // cards are pinned by index and face-down depth.
        let mut columns: SmallVec<[String; MAX_TABLEAU_SIZE]> = SmallVec::new();
        for (index, tableau) in self.tableaus.iter().enumerate() {
            let mut column = String::with_capacity(tableau.face_up.len() * 2 + 2);
            if !tableau.face_down.is_empty() {
                column.push((b'0' + index as u8) as char);
                column.push((b'0' + tableau.face_down.len() as u8) as char);
            }
            for card in &tableau.face_up {
                card.write_code(&mut column);
            }
            columns.push(column);
        }
        columns.sort_unstable();
        key.push_str(&columns.join(","));

        key
    }

    /// Parse a game from the text form produced by [`Game::pretty_print`].
    ///
    /// `Stock:` and `Waste:` list cards top first. `Foundations:` lists the
    /// top card of each non-empty pile. `TableauN:` lists face-down cards,
    /// a `|`, then the face-up run, both bottom first. The number of
    /// `Tableau` lines fixes the tableau size (7 when absent).
    pub fn parse(content: &str) -> Result<Self> {
        let mut rules = Rules::default();
        let mut stock: Vec<Card> = Vec::new();
        let mut waste: Vec<Card> = Vec::new();
        let mut foundations = [-1i8; TOTAL_FOUNDATIONS];
        let mut tableaus: Vec<Option<Tableau>> = Vec::new();

        for line in content
            .split('\n')
            .map(|v| v.trim())
            .filter(|l| !l.is_empty())
        {
            let line_context = || format!("Invalid line {line}");
            if let Some(rest) = line.strip_prefix("Stock:") {
                stock = Self::parse_cards(rest.trim()).with_context(line_context)?;
            } else if let Some(rest) = line.strip_prefix("Waste:") {
                waste = Self::parse_cards(rest.trim()).with_context(line_context)?;
            } else if let Some(rest) = line.strip_prefix("Foundations:") {
                for card in Self::parse_cards(rest.trim()).with_context(line_context)? {
                    foundations[card.suit() as usize] = card.rank() as i8;
                }
            } else if let Some(rest) = line.strip_prefix("Tableau") {
                let mut parts = rest.splitn(2, ':');
                let index = parts
                    .next()
                    .unwrap_or("")
                    .trim()
                    .parse::<usize>()
                    .context("Invalid tableau index")
                    .with_context(line_context)?;
                let cards_str = parts.next().unwrap_or("").trim();
                let (before, after) = if let Some(sep) = cards_str.find('|') {
                    let (b, a) = cards_str.split_at(sep);
                    (b, &a[1..])
                } else {
                    ("", cards_str)
                };
                let mut tableau = Tableau::default();
                tableau
                    .face_down
                    .extend(Self::parse_cards(before.trim()).with_context(line_context)?);
                tableau
                    .face_up
                    .extend(Self::parse_cards(after.trim()).with_context(line_context)?);
                if tableaus.len() <= index {
                    tableaus.resize(index + 1, None);
                }
                tableaus[index] = Some(tableau);
            } else if let Some(rest) = line.strip_prefix("DrawCount:") {
                rules.draw_count = rest
                    .trim()
                    .parse::<usize>()
                    .context("Invalid DrawCount")
                    .with_context(line_context)?;
            }
        }

        if !tableaus.is_empty() {
            rules.tableau_size = tableaus.len();
        }
        rules.validate()?;
        stock.reverse();
        waste.reverse();
        let mut tableaus: Vec<Tableau> =
            tableaus.into_iter().map(|t| t.unwrap_or_default()).collect();
        tableaus.resize_with(rules.tableau_size, Tableau::default);
        Ok(Game {
            rules,
            stock: SmallVec::from_vec(stock),
            waste: SmallVec::from_vec(waste),
            foundations,
            tableaus,
        })
    }

    fn parse_cards(s: &str) -> Result<Vec<Card>> {
        let mut cards = Vec::new();
        let mut chars = s.chars().peekable();
        while let Some(&c1) = chars.peek() {
            if c1.is_whitespace() {
                chars.next();
                continue;
            }
            let rank = c1;
            chars.next();
            let suit = match chars.next() {
                Some(s) => s,
                None => break,
            };
            cards.push(Card::parse(rank, suit)?);
        }
        Ok(cards)
    }

    pub fn pretty_print(&self) -> String {
        let mut output = String::new();

        if !self.stock.is_empty() {
            output.push_str("Stock: ");
            for card in self.stock.iter().rev() {
                output.push_str(&card.to_pretty_string());
            }
            output.push('\n');
        }

        if !self.waste.is_empty() {
            output.push_str("Waste: ");
            for card in self.waste.iter().rev() {
                output.push_str(&card.to_pretty_string());
            }
            output.push('\n');
        }

        let tops: Vec<String> = self
            .foundations
            .iter()
            .enumerate()
            .filter(|&(_, &height)| height >= 0)
            .map(|(suit, &height)| Card::new(height as u8, suit as u8).to_pretty_string())
            .collect();
        if !tops.is_empty() {
            output.push_str(&format!("Foundations: {}\n", tops.join(" ")));
        }

        for (index, tableau) in self.tableaus.iter().enumerate() {
            output.push_str(&format!("Tableau{index}: "));
            for card in &tableau.face_down {
                output.push_str(&card.to_pretty_string());
            }
            output.push('|');
            for card in &tableau.face_up {
                output.push_str(&card.to_pretty_string());
            }
            output.push('\n');
        }

        output.push_str(&format!("DrawCount: {}\n", self.rules.draw_count));

        output
    }
}
