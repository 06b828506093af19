//! Error types for skeleton loading and calibration.

use crate::bones::HumanBone;

/// Problems found while building a [`Skeleton`](crate::Skeleton) from a definition.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SkeletonError {
    #[error("bone {bone} is declared more than once")]
    DuplicateBone { bone: HumanBone },

    #[error("bone {bone} names parent {parent}, which is not part of the skeleton")]
    UnknownParent { bone: HumanBone, parent: HumanBone },

    #[error("bone {bone} names parent {parent}, which is declared after it")]
    ParentAfterChild { bone: HumanBone, parent: HumanBone },

    #[error("skeleton has no hips bone")]
    MissingHips,

    #[error("bone {bone} has a non-finite or zero rotation")]
    InvalidRotation { bone: HumanBone },

    #[error("bone {bone} has a non-finite position")]
    InvalidPosition { bone: HumanBone },

    #[error("failed to parse skeleton definition: {reason}")]
    Parse { reason: String },
}

impl From<serde_json::Error> for SkeletonError {
    fn from(err: serde_json::Error) -> Self {
        SkeletonError::Parse {
            reason: err.to_string(),
        }
    }
}

/// Calibration can only fail when the rig cannot define a humanoid frame.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CalibrationError {
    #[error("rig has no hips bone")]
    MissingHips,

    #[error("hips world transform is not finite")]
    DegenerateBasis,
}
