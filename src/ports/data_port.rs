//! Data access port trait.

use crate::domain::error::ReinvestorError;
use crate::domain::frame::Frame;

pub trait DataPort {
    /// Loads a table, indexing it by `time_column`.
    ///
    /// A missing source is [`ReinvestorError::NotFound`]; a source without
    /// `time_column` is [`ReinvestorError::Schema`].
    fn read_frame(&self, source: &str, time_column: &str) -> Result<Frame, ReinvestorError>;
}
