use ahash::AHashMap;
use patience_common::game::Game;
use patience_common::moves::Move;
use smallvec::SmallVec;

pub type MoveList = SmallVec<[Move; 64]>;

type StackMoves = SmallVec<[Move; 16]>;

/// Produces the ordered candidate moves for a position.
///
/// Ordering, earlier groups tried first: aces to foundation, other
/// foundation plays, whole-stack tableau moves (sorted by how much they
/// stand to reveal), waste to tableau, draw, then partial-stack tableau
/// moves. The two tableau-to-tableau groups depend only on the face-up
/// layout, so their legality scans are cached per layout for the lifetime
/// of the solver.
#[derive(Debug, Default)]
pub struct MoveEnumerator {
    revealing: AHashMap<String, StackMoves>,
    partial: AHashMap<String, StackMoves>,
    cache_hits: u64,
    cache_lookups: u64,
}

impl MoveEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fraction of layout-cache lookups answered from the cache.
    pub fn hit_ratio(&self) -> f64 {
        if self.cache_lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.cache_lookups as f64
        }
    }

    pub fn enumerate(&mut self, game: &Game) -> MoveList {
        let mut moves = MoveList::new();

        self.compute_ace_moves(game, &mut moves);
        self.compute_foundation_moves(game, &mut moves);
        self.compute_revealing_moves(game, &mut moves);
        self.compute_waste_moves(game, &mut moves);
        if game.is_valid(Move::Draw) {
            moves.push(Move::Draw);
        }
        self.compute_partial_moves(game, &mut moves);

        moves
    }

    /// Aces are always safe, so they jump the queue: waste first, then
    /// tableau tops in column order.
    fn compute_ace_moves(&mut self, game: &Game, moves: &mut MoveList) {
        if let Some(top) = game.waste.last()
            && top.is_ace()
        {
            moves.push(Move::WasteToFoundation);
        }
        for (index, tableau) in game.tableaus.iter().enumerate() {
            if let Some(top) = tableau.face_up.last()
                && top.is_ace()
            {
                moves.push(Move::TableauToFoundation(index as u8));
            }
        }
    }

    fn compute_foundation_moves(&mut self, game: &Game, moves: &mut MoveList) {
        if let Some(top) = game.waste.last()
            && !top.is_ace()
            && game.is_valid(Move::WasteToFoundation)
        {
            moves.push(Move::WasteToFoundation);
        }
        for (index, tableau) in game.tableaus.iter().enumerate() {
            let mv = Move::TableauToFoundation(index as u8);
            if let Some(top) = tableau.face_up.last()
                && !top.is_ace()
                && game.is_valid(mv)
            {
                moves.push(mv);
            }
        }
    }

    /// Whole-stack moves (row 0). With an empty column on the board, prefer
    /// sources with the most face-down cards; otherwise prefer the fewest.
    /// Ties keep ascending source order.
    fn compute_revealing_moves(&mut self, game: &Game, moves: &mut MoveList) {
        let key = layout_key(game);
        self.cache_lookups += 1;
        if self.revealing.contains_key(&key) {
            self.cache_hits += 1;
        } else {
            let mut found = StackMoves::new();
            for src in 0..game.tableaus.len() {
                if game.tableaus[src].face_up.is_empty() {
                    continue;
                }
                for dst in 0..game.tableaus.len() {
                    let mv = Move::TableauToTableau {
                        src: src as u8,
                        row: 0,
                        dst: dst as u8,
                    };
                    if src != dst && game.is_valid(mv) {
                        found.push(mv);
                    }
                }
            }
            self.revealing.insert(key.clone(), found);
        }
        let mut revealing = self.revealing[&key].clone();

        let face_down_len = |mv: &Move| match mv {
            Move::TableauToTableau { src, .. } => game.tableaus[*src as usize].face_down.len(),
            _ => 0,
        };
        if game.tableaus.iter().any(|t| t.is_empty()) {
            revealing.sort_by_key(|mv| std::cmp::Reverse(face_down_len(mv)));
        } else {
            revealing.sort_by_key(face_down_len);
        }
        moves.extend(revealing);
    }

    fn compute_waste_moves(&mut self, game: &Game, moves: &mut MoveList) {
        if game.waste.is_empty() {
            return;
        }
        for dst in 0..game.tableaus.len() {
            let mv = Move::WasteToTableau(dst as u8);
            if game.is_valid(mv) {
                moves.push(mv);
            }
        }
    }

    /// Partial-stack moves (row >= 1). These never expose a face-down card,
    /// so they come last.
    fn compute_partial_moves(&mut self, game: &Game, moves: &mut MoveList) {
        let key = layout_key(game);
        self.cache_lookups += 1;
        if self.partial.contains_key(&key) {
            self.cache_hits += 1;
        } else {
            let mut found = StackMoves::new();
            for src in 0..game.tableaus.len() {
                for row in 1..game.tableaus[src].face_up.len() {
                    for dst in 0..game.tableaus.len() {
                        let mv = Move::TableauToTableau {
                            src: src as u8,
                            row: row as u8,
                            dst: dst as u8,
                        };
                        if src != dst && game.is_valid(mv) {
                            found.push(mv);
                        }
                    }
                }
            }
            self.partial.insert(key.clone(), found);
        }
        moves.extend(self.partial[&key].iter().copied());
    }
}

fn layout_key(game: &Game) -> String {
    let mut key = String::new();
    for tableau in &game.tableaus {
        key.push_str(&tableau.face_up_code());
        key.push(',');
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waste_ace_enumerated_first() {
        let game = Game::parse(
            "Waste: AH
             Foundations: AS
             Tableau0: |2S
             Tableau1: |KD
             DrawCount: 3",
        )
        .unwrap();
        let moves = MoveEnumerator::new().enumerate(&game);
        assert_eq!(moves[0], Move::WasteToFoundation);
        let position = |mv: Move| moves.iter().position(|&m| m == mv).unwrap();
        assert!(position(Move::TableauToFoundation(0)) < position(Move::WasteToTableau(0)));
        assert!(position(Move::WasteToTableau(0)) < position(Move::Draw));
    }

    #[test]
    fn test_tableau_aces_in_column_order() {
        let game = Game::parse(
            "Tableau0: |5H
             Tableau1: |AC
             Tableau2: |AD
             DrawCount: 3",
        )
        .unwrap();
        let moves = MoveEnumerator::new().enumerate(&game);
        assert_eq!(moves[0], Move::TableauToFoundation(1));
        assert_eq!(moves[1], Move::TableauToFoundation(2));
    }

    #[test]
    fn test_revealing_sort_with_empty_column() {
        let game = Game::parse(
            "Tableau0: 2C2D|QS
             Tableau1: 2H|QH
             Tableau2: |KD
             Tableau3: |KS
             Tableau4: |
             DrawCount: 3",
        )
        .unwrap();
        let moves = MoveEnumerator::new().enumerate(&game);
        let revealing: Vec<Move> = moves
            .iter()
            .copied()
            .filter(|mv| matches!(mv, Move::TableauToTableau { row: 0, .. }))
            .collect();
        // An empty column exists: most face-down cards first.
        assert_eq!(
            revealing,
            vec![
                Move::TableauToTableau { src: 0, row: 0, dst: 2 },
                Move::TableauToTableau { src: 1, row: 0, dst: 3 },
                Move::TableauToTableau { src: 2, row: 0, dst: 4 },
                Move::TableauToTableau { src: 3, row: 0, dst: 4 },
            ]
        );
    }

    #[test]
    fn test_revealing_sort_without_empty_column() {
        let game = Game::parse(
            "Tableau0: 2C2D|QS
             Tableau1: 2H|QH
             Tableau2: |KD
             Tableau3: |KS
             DrawCount: 3",
        )
        .unwrap();
        let moves = MoveEnumerator::new().enumerate(&game);
        let revealing: Vec<Move> = moves
            .iter()
            .copied()
            .filter(|mv| matches!(mv, Move::TableauToTableau { row: 0, .. }))
            .collect();
        // No empty column: fewest face-down cards first.
        assert_eq!(
            revealing,
            vec![
                Move::TableauToTableau { src: 1, row: 0, dst: 3 },
                Move::TableauToTableau { src: 0, row: 0, dst: 2 },
            ]
        );
    }

    #[test]
    fn test_partial_moves_come_last_and_cache() {
        let game = Game::parse(
            "Stock: 4D
             Tableau0: 2C|9H8S
             Tableau1: |TS9D
             DrawCount: 3",
        )
        .unwrap();
        let mut enumerator = MoveEnumerator::new();
        let moves = enumerator.enumerate(&game);
        // 8S may slide from under 9H onto 9D, but only after the draw.
        assert_eq!(
            moves.as_slice(),
            &[Move::Draw, Move::TableauToTableau { src: 0, row: 1, dst: 1 }]
        );
        assert_eq!(enumerator.hit_ratio(), 0.0);
        enumerator.enumerate(&game);
        assert!(enumerator.hit_ratio() > 0.0);
    }
}
