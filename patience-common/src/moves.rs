use crate::game::Game;

/// A single Klondike move. Copyable, no heap payload.
///
/// `FoundationToTableau` exists for completeness of the game model; the
/// search engine never emits it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Move {
    Draw,
    WasteToFoundation,
    WasteToTableau(u8),
    TableauToFoundation(u8),
    TableauToTableau { src: u8, row: u8, dst: u8 },
    FoundationToTableau { suit: u8, dst: u8 },
}

impl Move {
    /// Stable wire tag for result envelopes.
    pub fn kind_tag(&self) -> &'static str {
        match self {
            Move::Draw => "DRAW",
            Move::WasteToFoundation => "WASTE_TO_FOUNDATION",
            Move::WasteToTableau(_) => "WASTE_TO_TABLEAU",
            Move::TableauToFoundation(_) => "TABLEAU_TO_FOUNDATION",
            Move::TableauToTableau { .. } => "TABLEAU_TO_TABLEAU",
            Move::FoundationToTableau { .. } => "FOUNDATION_TO_TABLEAU",
        }
    }

    /// Integer payloads in wire order.
    pub fn extras(&self) -> Vec<u8> {
        match *self {
            Move::Draw | Move::WasteToFoundation => vec![],
            Move::WasteToTableau(dst) => vec![dst],
            Move::TableauToFoundation(src) => vec![src],
            Move::TableauToTableau { src, row, dst } => vec![src, row, dst],
            Move::FoundationToTableau { suit, dst } => vec![suit, dst],
        }
    }
}

/// Render a move list as a compact fixed-width table, runs of draws collapsed.
pub fn format_moves(moves: &[Move]) -> String {
    let mut list = vec![];
    let mut i = 0;
    while i < moves.len() {
        match moves[i] {
            Move::Draw => {
                let mut count = 1;
                while i + count < moves.len() && matches!(moves[i + count], Move::Draw) {
                    count += 1;
                }
                let str = if count == 1 {
                    "D".into()
                } else {
                    format!("{count}D")
                };
                list.push(str);
                i += count;
                continue;
            }
            Move::WasteToFoundation => {
                list.push("W:F".into());
            }
            Move::WasteToTableau(dst) => {
                list.push(format!("W:T{}", dst + 1));
            }
            Move::TableauToFoundation(src) => {
                list.push(format!("T{}:F", src + 1));
            }
            Move::TableauToTableau { src, row, dst } => {
                let mut str = format!("T{}:T{}", src + 1, dst + 1);
                if row > 0 {
                    str.push_str(&format!("@{row}"));
                }
                list.push(str);
            }
            Move::FoundationToTableau { suit, dst } => {
                list.push(format!("F{}:T{}", suit + 1, dst + 1));
            }
        }
        i += 1;
    }

    let mut output = String::new();
    let max_width = list.iter().map(|s| s.len()).max().unwrap_or_default() + 1;
    for chunk in list.chunks(10) {
        for cmd in chunk {
            output.push_str(&format!("{cmd:<width$}", width = max_width));
        }
        output.push('\n');
    }

    output
}

/// Describe a move against the position it is about to be applied to.
pub fn describe_move(game: &Game, mv: &Move) -> String {
    let format_card = |card: Option<&crate::card::Card>| -> String {
        card.map(|c| c.to_pretty_string()).unwrap_or_default()
    };

    match mv {
        Move::Draw => {
            let mut game = game.clone();
            game.apply(Move::Draw);
            let card = format_card(game.waste.last());
            format!("Draw {card}")
        }
        Move::WasteToFoundation => {
            let from_card = format_card(game.waste.last());
            format!("(Waste) {from_card} -> (Foundation)")
        }
        Move::WasteToTableau(dst) => {
            let from_card = format_card(game.waste.last());
            let to_card = format_card(game.tableaus[*dst as usize].face_up.last());
            format!("(Waste) {from_card} -> (Tableau{}) {to_card}", dst + 1)
        }
        Move::TableauToFoundation(src) => {
            let from_card = format_card(game.tableaus[*src as usize].face_up.last());
            format!("(Tableau{}) {from_card} -> (Foundation)", src + 1)
        }
        Move::TableauToTableau { src, row, dst } => {
            let from_cards = game.tableaus[*src as usize]
                .face_up
                .iter()
                .skip(*row as usize)
                .map(|c| c.to_pretty_string())
                .collect::<Vec<_>>()
                .join("");
            let to_card = format_card(game.tableaus[*dst as usize].face_up.last());
            format!("(Tableau{}) {from_cards} -> (Tableau{}) {to_card}", src + 1, dst + 1)
        }
        Move::FoundationToTableau { suit, dst } => {
            let height = game.foundations[*suit as usize];
            let from_card = if height >= 0 {
                crate::card::Card::new(height as u8, *suit).to_pretty_string()
            } else {
                String::new()
            };
            let to_card = format_card(game.tableaus[*dst as usize].face_up.last());
            format!("(Foundation) {from_card} -> (Tableau{}) {to_card}", dst + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(Move::Draw.kind_tag(), "DRAW");
        assert_eq!(Move::Draw.extras(), Vec::<u8>::new());
        let mv = Move::TableauToTableau { src: 2, row: 1, dst: 5 };
        assert_eq!(mv.kind_tag(), "TABLEAU_TO_TABLEAU");
        assert_eq!(mv.extras(), vec![2, 1, 5]);
        let mv = Move::FoundationToTableau { suit: 3, dst: 0 };
        assert_eq!(mv.extras(), vec![3, 0]);
    }

    #[test]
    fn test_format_moves() {
        let moves = [
            Move::Draw,
            Move::Draw,
            Move::Draw,
            Move::WasteToFoundation,
            Move::TableauToTableau { src: 0, row: 2, dst: 3 },
            Move::Draw,
        ];
        let output = format_moves(&moves);
        assert!(output.contains("3D"));
        assert!(output.contains("W:F"));
        assert!(output.contains("T1:T4@2"));
    }
}
