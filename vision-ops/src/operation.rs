//! Named frame operations

use std::fmt;
use vision_frame::Frame;

/// Transform signature every operation implements
///
/// Operations take ownership of the frame so they may work in place. Output
/// dimensions may differ from the input.
pub type TransformFn = dyn Fn(Frame) -> Frame + Send + Sync;

/// Whether an operation touches pixels at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// Pass-through, used for pausing
    Identity,
    /// Externally supplied transform
    Transform,
}

/// A registered, immutable frame operation
pub struct Operation {
    name: String,
    kind: OperationKind,
    transform: Box<TransformFn>,
}

impl Operation {
    pub(crate) fn identity(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: OperationKind::Identity,
            transform: Box::new(|frame| frame),
        }
    }

    pub(crate) fn transform<F>(name: String, f: F) -> Self
    where
        F: Fn(Frame) -> Frame + Send + Sync + 'static,
    {
        Self {
            name,
            kind: OperationKind::Transform,
            transform: Box::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn is_identity(&self) -> bool {
        self.kind == OperationKind::Identity
    }

    /// Run the transform on one frame
    pub fn apply(&self, frame: Frame) -> Frame {
        (self.transform)(frame)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_returns_frame_unchanged() {
        let op = Operation::identity("No Detection");
        let frame = Frame::new(2, 1, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();

        assert!(op.is_identity());
        assert_eq!(op.apply(frame.clone()), frame);
    }

    #[test]
    fn test_transform_may_change_shape() {
        let op = Operation::transform("Gray".to_string(), |frame: Frame| {
            let gray = frame
                .data()
                .chunks_exact(3)
                .map(|px| ((px[0] as u16 + px[1] as u16 + px[2] as u16) / 3) as u8)
                .collect();
            Frame::new(frame.width(), frame.height(), 1, gray).unwrap()
        });

        let out = op.apply(Frame::filled(2, 2, 3, 90).unwrap());
        assert_eq!(op.kind(), OperationKind::Transform);
        assert_eq!(out.channels(), 1);
        assert_eq!(out.data(), &[90; 4]);
    }
}
