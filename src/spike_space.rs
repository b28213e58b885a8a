use simple_error::{SimpleError, SimpleResult};

/// Indices of all neurons that fired during one step, across the whole population.
///
/// The buffer is sized to the worst case and reused from step to step; only the
/// first `count` entries are valid. Valid entries must be strictly ascending.
#[derive(Debug, Clone, Default)]
pub struct SpikeSpace {
    events: Vec<usize>,
    count: usize,
}

impl SpikeSpace {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            count: 0,
        }
    }

    pub fn from_spiking_nids(spiking_nids: &[usize]) -> Self {
        let mut result = Self::with_capacity(spiking_nids.len());
        for nid in spiking_nids {
            result.push(*nid);
        }
        result
    }

    /// Converts a buffer in the trailer layout, where the last slot holds the
    /// number of valid entries at the front of the buffer.
    pub fn from_trailer_buffer(mut buffer: Vec<usize>) -> SimpleResult<Self> {
        let count = match buffer.pop() {
            Some(count) => count,
            None => return Err(SimpleError::new("trailer buffer must not be empty")),
        };

        if count > buffer.len() {
            return Err(SimpleError::new(format!(
                "trailer count {} exceeds buffer capacity {}",
                count,
                buffer.len()
            )));
        }

        Ok(Self {
            events: buffer,
            count,
        })
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn push(&mut self, nid: usize) {
        #[cfg(debug_assertions)]
        assert!(self.count == 0 || self.events[self.count - 1] < nid);

        if self.count < self.events.len() {
            self.events[self.count] = nid;
        } else {
            self.events.push(nid);
        }
        self.count += 1;
    }

    pub fn spikes(&self) -> &[usize] {
        &self.events[..self.count]
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
