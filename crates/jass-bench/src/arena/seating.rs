/// Deterministic seatings for one deal: rotation `r` moves every agent `r`
/// seats clockwise, so an odd rotation swaps which team each agent plays for.
pub struct SeatRotations {
    rotations: Vec<[usize; 4]>,
}

impl SeatRotations {
    pub fn new(count: usize) -> Self {
        let rotations = (0..count.clamp(1, 4))
            .map(|shift| std::array::from_fn(|seat| (seat + 4 - shift) % 4))
            .collect();
        Self { rotations }
    }

    /// For each rotation, the agent index seated North, East, South, West.
    pub fn as_slice(&self) -> &[[usize; 4]] {
        &self.rotations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_rotation_is_identity() {
        let rotations = SeatRotations::new(1);
        assert_eq!(rotations.as_slice(), &[[0, 1, 2, 3]]);
    }

    #[test]
    fn second_rotation_swaps_teams() {
        let rotations = SeatRotations::new(2);
        let swapped = rotations.as_slice()[1];
        assert_eq!(swapped, [3, 0, 1, 2]);
        // agent 0 started North/South and now sits East
        assert_eq!(swapped.iter().position(|&a| a == 0), Some(1));
    }

    #[test]
    fn caps_at_four() {
        assert_eq!(SeatRotations::new(10).as_slice().len(), 4);
        assert_eq!(SeatRotations::new(0).as_slice().len(), 1);
    }
}
