use crate::types::Timestamp;

/// Append-only record of `(local index, time)` pairs, kept as two parallel vectors.
#[derive(Debug, Clone, Default)]
pub struct SpikeLog {
    indices: Vec<usize>,
    times: Vec<Timestamp>,
}

impl SpikeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one entry per local index. A step without spikes leaves no trace.
    pub fn record(
        &mut self,
        local_indices: impl IntoIterator<Item = usize>,
        t: Timestamp,
    ) -> usize {
        let len_before = self.indices.len();
        self.indices.extend(local_indices);
        let num_recorded = self.indices.len() - len_before;
        self.times.resize(self.indices.len(), t);
        num_recorded
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn times(&self) -> &[Timestamp] {
        &self.times
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Timestamp)> + '_ {
        self.indices.iter().copied().zip(self.times.iter().copied())
    }
}
