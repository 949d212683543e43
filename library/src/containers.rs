use crate::{Block, Planner};

/// Fixed size ring buffer of blocks, oldest block at `begin`.
#[derive(Clone)]
pub struct BlockQueue<const SIZE: usize> {
    data: [Block; SIZE],
    begin: usize,
    length: usize,
    position_update_requests: u32,
}

impl<const SIZE: usize> Default for BlockQueue<SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const SIZE: usize> BlockQueue<SIZE> {
    pub const fn new() -> Self {
        Self {
            data: [Block::AirGasDisable; SIZE],
            begin: 0,
            length: 0,
            position_update_requests: 0,
        }
    }

    fn wrap_index(i: usize) -> usize {
        match i {
            i if i >= SIZE => i - SIZE,
            i => i,
        }
    }

    /// Append a block, handing it back when the queue is full.
    pub fn push(&mut self, block: Block) -> Result<(), Block> {
        if self.length == SIZE {
            return Err(block);
        }
        let i = Self::wrap_index(self.begin + self.length);
        self.data[i] = block;
        self.length += 1;
        Ok(())
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn is_full(&self) -> bool {
        self.length == SIZE
    }

    /// How often the stepper asked for the planner position to be re-read.
    pub fn position_update_requests(&self) -> u32 {
        self.position_update_requests
    }
}

impl<const SIZE: usize> Planner for BlockQueue<SIZE> {
    fn current_block(&mut self) -> Option<Block> {
        if self.is_empty() { None } else { Some(self.data[self.begin]) }
    }

    fn discard_current_block(&mut self) {
        if !self.is_empty() {
            self.begin = Self::wrap_index(self.begin + 1);
            self.length -= 1;
        }
    }

    fn reset_block_buffer(&mut self) {
        self.begin = 0;
        self.length = 0;
    }

    fn request_position_update(&mut self) {
        self.position_update_requests += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_small() {
        let mut c = BlockQueue::<1>::default();
        assert_eq!(c.push(Block::AirEnable), Ok(()));
        assert_eq!(c.length(), 1);
        assert_eq!(c.current_block(), Some(Block::AirEnable));
    }

    #[test]
    fn push_full_hands_block_back() {
        let mut c = BlockQueue::<1>::default();
        assert_eq!(c.push(Block::AirEnable), Ok(()));
        assert_eq!(c.push(Block::GasEnable), Err(Block::GasEnable));
        assert!(c.is_full());
        assert_eq!(c.current_block(), Some(Block::AirEnable), "full push must not overwrite");
    }

    #[test]
    fn current_block_stays_until_discarded() {
        let mut c = BlockQueue::<2>::default();
        let _ = c.push(Block::AirEnable);
        let _ = c.push(Block::GasEnable);
        assert_eq!(c.current_block(), Some(Block::AirEnable));
        assert_eq!(c.current_block(), Some(Block::AirEnable));
        c.discard_current_block();
        assert_eq!(c.current_block(), Some(Block::GasEnable));
        c.discard_current_block();
        assert_eq!(c.current_block(), None);
        c.discard_current_block();
        assert!(c.is_empty());
    }

    #[test]
    fn push_begin_end_with_overlap() {
        let mut c = BlockQueue::<2>::default();
        let _ = c.push(Block::AirEnable);
        let _ = c.push(Block::GasEnable);
        c.discard_current_block();
        assert_eq!(c.begin, 1);
        let _ = c.push(Block::AirGasDisable);
        assert_eq!(c.begin, 1);
        assert_eq!(c.length, 2);
        assert_eq!(c.data[0], Block::AirGasDisable, "wrapped to the front");
        c.discard_current_block();
        assert_eq!(c.current_block(), Some(Block::AirGasDisable));
    }

    #[test]
    fn reset_empties_queue() {
        let mut c = BlockQueue::<3>::default();
        let _ = c.push(Block::AirEnable);
        let _ = c.push(Block::GasEnable);
        c.reset_block_buffer();
        assert!(c.is_empty());
        assert_eq!(c.current_block(), None);
        c.request_position_update();
        assert_eq!(c.position_update_requests(), 1);
    }
}
