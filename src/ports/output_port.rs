//! Output port trait.

use crate::domain::error::ReinvestorError;
use crate::domain::frame::Frame;

pub trait OutputPort {
    fn write_frame(&self, frame: &Frame, destination: &str) -> Result<(), ReinvestorError>;
}
