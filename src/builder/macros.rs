//! Macros for ergonomic side-effect registration.

/// Generate State trait implementation for simple enums.
///
/// # Example
///
/// ```
/// use flowscope::state_enum;
///
/// state_enum! {
///     pub enum Connection {
///         Connecting,
///         Online,
///         Closed,
///         Broken,
///     }
///     final: [Closed, Broken]
///     error: [Broken]
/// }
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
        $(error: [$($error:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    _ => false,
                }
            }

            fn is_error(&self) -> bool {
                match self {
                    $($(Self::$error => true,)*)?
                    _ => false,
                }
            }
        }
    };
}

/// Build an action matcher from a pattern over the action enum.
///
/// `matches_action!(Pattern => value)` yields `Some(value)` for matching
/// actions; `matches_action!(Pattern)` yields `Some(())`.
///
/// # Example
///
/// ```
/// use flowscope::matches_action;
///
/// #[derive(Clone, Debug)]
/// enum Input {
///     Select(u32),
///     Clear,
/// }
///
/// fn apply<M: Fn(&Input) -> Option<u32>>(matcher: M, input: &Input) -> Option<u32> {
///     matcher(input)
/// }
///
/// assert_eq!(apply(matches_action!(Input::Select(id) => *id), &Input::Select(4)), Some(4));
/// assert_eq!(apply(matches_action!(Input::Select(id) => *id), &Input::Clear), None);
/// ```
#[macro_export]
macro_rules! matches_action {
    ($pattern:pat => $value:expr) => {
        |action| match action {
            $pattern => ::core::option::Option::Some($value),
            #[allow(unreachable_patterns)]
            _ => ::core::option::Option::None,
        }
    };
    ($pattern:pat) => {
        |action| match action {
            $pattern => ::core::option::Option::Some(()),
            #[allow(unreachable_patterns)]
            _ => ::core::option::Option::None,
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::State;

    state_enum! {
        enum TestState {
            Idle,
            Running,
            Done,
            Failed,
        }
        final: [Done, Failed]
        error: [Failed]
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Start { delay: u64 },
        Stop,
        Reset,
    }

    fn project<T>(matcher: impl Fn(&TestAction) -> Option<T>, action: &TestAction) -> Option<T> {
        matcher(action)
    }

    #[test]
    fn state_enum_macro_generates_trait() {
        assert_eq!(TestState::Running.name(), "Running");
        assert!(!TestState::Idle.is_final());
        assert!(TestState::Done.is_final());
        assert!(!TestState::Done.is_error());
        assert!(TestState::Failed.is_error());
    }

    #[test]
    fn state_enum_works_without_final_error() {
        state_enum! {
            enum MinimalState {
                One,
                Two,
            }
        }

        assert!(!MinimalState::One.is_final());
        assert!(!MinimalState::Two.is_error());
    }

    #[test]
    fn matcher_extracts_payload() {
        let start = TestAction::Start { delay: 5 };
        assert_eq!(
            project(matches_action!(TestAction::Start { delay } => *delay), &start),
            Some(5)
        );
        assert_eq!(
            project(matches_action!(TestAction::Start { delay } => *delay), &TestAction::Stop),
            None
        );
    }

    #[test]
    fn matcher_without_payload() {
        assert_eq!(project(matches_action!(TestAction::Stop), &TestAction::Stop), Some(()));
        assert_eq!(project(matches_action!(TestAction::Stop), &TestAction::Reset), None);
    }

    #[test]
    fn matcher_accepts_or_patterns() {
        let matcher = |a: &TestAction| project(matches_action!(TestAction::Stop | TestAction::Reset), a);
        assert_eq!(matcher(&TestAction::Reset), Some(()));
        assert_eq!(matcher(&TestAction::Start { delay: 1 }), None);
    }
}
