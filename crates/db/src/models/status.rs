//! Job state enum mapping to the SMALLINT `state` column.
//!
//! The discriminants are part of the wire contract (`stateOneOf` filters
//! and admin listings expose them), so they are fixed here rather than
//! derived.

/// State ID type matching SMALLINT in the database.
pub type StateId = i16;

macro_rules! define_state_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database state ID.
            pub fn id(self) -> StateId {
                self as StateId
            }

            /// Map a database state ID back to the enum.
            pub fn from_id(id: StateId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StateId {
            fn from(value: $name) -> Self {
                value as StateId
            }
        }
    };
}

define_state_enum! {
    /// Runner job lifecycle state.
    JobState {
        /// Waiting to be leased by a runner.
        Pending = 1,
        /// Leased: `runner_id` and `processing_job_token` are set.
        Processing = 2,
        Completed = 3,
        Errored = 4,
        Cancelled = 5,
    }
}

impl JobState {
    /// Human label used in admin listings.
    pub fn label(self) -> &'static str {
        match self {
            JobState::Pending => "Pending",
            JobState::Processing => "Processing",
            JobState::Completed => "Completed",
            JobState::Errored => "Errored",
            JobState::Cancelled => "Cancelled",
        }
    }

    /// Terminal states cannot be cancelled again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Errored | JobState::Cancelled
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for state in [
            JobState::Pending,
            JobState::Processing,
            JobState::Completed,
            JobState::Errored,
            JobState::Cancelled,
        ] {
            assert_eq!(JobState::from_id(state.id()), Some(state));
        }
        assert_eq!(JobState::from_id(42), None);
    }

    #[test]
    fn terminal_classification() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Errored.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
    }
}
