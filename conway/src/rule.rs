// rule.rs - Conway's B3/S23 transition

/// Next state of a cell given its current state and live Moore neighbours.
pub fn next_state(alive: bool, live_neighbors: u8) -> bool {
    match (alive, live_neighbors) {
        (true, 2) | (true, 3) => true,   // Survival
        (true, _)             => false,  // Isolation or overcrowding
        (false, 3)            => true,   // Birth
        (false, _)            => false,
    }
}

/// Whether the cell must be listed in a ChangeSet.
#[inline]
pub fn flips(alive: bool, live_neighbors: u8) -> bool {
    next_state(alive, live_neighbors) != alive
}
