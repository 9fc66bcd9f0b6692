use anyhow::{Context, Result, bail};
use rand::Rng;
use rand::seq::SliceRandom;

pub const TOTAL_RANKS: u8 = 13;
pub const TOTAL_SUITS: u8 = 4;
pub const DECK_SIZE: usize = 52;

const RANKS: [char; 13] = [
    'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];
const SUITS: [char; 4] = ['S', 'H', 'D', 'C'];
const SUIT_GLYPHS: [char; 4] = ['♠', '♥', '♦', '♣'];

/// A playing card packed into one byte: high nibble suit, low nibble rank.
///
/// Ranks run A < 2 < … < T < J < Q < K (indices 0..=12). Suits are indexed
/// S, H, D, C; spades and clubs are black, hearts and diamonds red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card(u8);

impl Card {
    pub fn new(rank: u8, suit: u8) -> Self {
        assert!(rank < TOTAL_RANKS, "Rank must be less than {TOTAL_RANKS}");
        assert!(suit < TOTAL_SUITS, "Suit must be less than {TOTAL_SUITS}");
        Self((suit << 4) | rank)
    }

    /// Parse a card from its two characters, e.g. `('A', 'S')` or `('A', '♠')`.
    pub fn parse(rank: char, suit: char) -> Result<Self> {
        let rank_idx = RANKS
            .iter()
            .position(|&r| r == rank)
            .with_context(|| format!("Invalid rank of card {rank}{suit}"))?;
        let suit_idx = SUITS
            .iter()
            .position(|&s| s == suit)
            .or_else(|| SUIT_GLYPHS.iter().position(|&s| s == suit))
            .with_context(|| format!("Invalid suit of card {rank}{suit}"))?;
        Ok(Card::new(rank_idx as u8, suit_idx as u8))
    }

    #[inline]
    pub fn rank(&self) -> u8 {
        self.0 & 0x0F
    }

    #[inline]
    pub fn suit(&self) -> u8 {
        self.0 >> 4
    }

    /// Dense index in 0..52, suit-major.
    #[inline]
    pub fn id(&self) -> u8 {
        self.suit() * TOTAL_RANKS + self.rank()
    }

    #[inline]
    pub fn is_red(&self) -> bool {
        self.suit() == 1 || self.suit() == 2
    }

    #[inline]
    pub fn is_ace(&self) -> bool {
        self.rank() == 0
    }

    #[inline]
    pub fn is_king(&self) -> bool {
        self.rank() == TOTAL_RANKS - 1
    }

    /// Whether this card may sit on `other` in a tableau run.
    #[inline]
    pub fn fits_under(&self, other: Card) -> bool {
        other.rank() == self.rank() + 1 && other.is_red() != self.is_red()
    }

    /// Append the canonical two-char ASCII form (`AS`, `TD`, `KH`).
    pub fn write_code(&self, out: &mut String) {
        out.push(RANKS[self.rank() as usize]);
        out.push(SUITS[self.suit() as usize]);
    }

    pub fn code(&self) -> String {
        let mut out = String::with_capacity(2);
        self.write_code(&mut out);
        out
    }

    pub fn to_pretty_string(&self) -> String {
        format!(
            "{}{}",
            RANKS[self.rank() as usize],
            SUIT_GLYPHS[self.suit() as usize]
        )
    }
}

/// An ordered 52-card permutation used only for the initial deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck([Card; DECK_SIZE]);

impl Deck {
    /// The unshuffled reference deck, suit-major in suit order S, H, D, C.
    pub fn standard() -> Self {
        let mut cards = [Card::new(0, 0); DECK_SIZE];
        for (i, card) in cards.iter_mut().enumerate() {
            *card = Card::new((i % TOTAL_RANKS as usize) as u8, (i / TOTAL_RANKS as usize) as u8);
        }
        Deck(cards)
    }

    /// Parse a 104-char ASCII deck line: 52 two-char cards, no separator.
    pub fn parse(line: &str) -> Result<Self> {
        let chars: Vec<char> = line.trim().chars().collect();
        if chars.len() != DECK_SIZE * 2 {
            bail!(
                "Deck line must be {} characters, got {}",
                DECK_SIZE * 2,
                chars.len()
            );
        }
        let mut cards = [Card::new(0, 0); DECK_SIZE];
        let mut seen = 0u64;
        for (i, pair) in chars.chunks(2).enumerate() {
            let card = Card::parse(pair[0], pair[1])
                .with_context(|| format!("Invalid card at position {i}"))?;
            let bit = 1u64 << card.id();
            if seen & bit != 0 {
                bail!("Duplicate card {} at position {i}", card.code());
            }
            seen |= bit;
            cards[i] = card;
        }
        Ok(Deck(cards))
    }

    #[inline]
    pub fn cards(&self) -> &[Card; DECK_SIZE] {
        &self.0
    }

    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.0.shuffle(rng);
    }

    /// The 104-char line form accepted by [`Deck::parse`].
    pub fn to_line(&self) -> String {
        let mut line = String::with_capacity(DECK_SIZE * 2);
        for card in &self.0 {
            card.write_code(&mut line);
        }
        line
    }
}
