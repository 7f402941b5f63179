//! Setup sequence gate.
//!
//! A server is assembled from an ordered list of setup steps: application
//! middleware plus exactly one [`SetupStep::RegisterRoutes`] and exactly one
//! [`SetupStep::StartListening`] marker, in that order. Middleware before the
//! register marker runs ahead of every route; middleware after it only sees
//! requests no route answered. The list is checked once, before anything is
//! mounted.

use crate::error::{ServerError, ServerResult};
use archrest_middleware::BoxedMiddleware;
use std::fmt;
use std::sync::Arc;

/// The two required markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceMarker {
    /// Where controller routes are mounted.
    RegisterRoutes,
    /// Where the listener is bound.
    StartListening,
}

impl fmt::Display for SequenceMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RegisterRoutes => "RegisterRoutes",
            Self::StartListening => "StartListening",
        })
    }
}

/// One step of the setup sequence.
#[derive(Clone)]
pub enum SetupStep {
    /// Application-wide middleware.
    Middleware(BoxedMiddleware),
    /// Mount controller routes here.
    RegisterRoutes,
    /// Bind the listener here.
    StartListening,
}

impl fmt::Debug for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Middleware(m) => f.debug_tuple("Middleware").field(&m.name()).finish(),
            Self::RegisterRoutes => f.write_str("RegisterRoutes"),
            Self::StartListening => f.write_str("StartListening"),
        }
    }
}

/// An ordered list of setup steps.
///
/// ```
/// use archrest_middleware::BodyParser;
/// use archrest_server::Sequence;
///
/// let plan = Sequence::new()
///     .middleware(BodyParser::json())
///     .register_routes()
///     .start_listening()
///     .validate()
///     .unwrap();
///
/// assert_eq!(plan.before_routes.len(), 1);
/// assert!(plan.after_routes.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    steps: Vec<SetupStep>,
}

impl Sequence {
    /// An empty sequence. It fails validation until both markers are added.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `[RegisterRoutes, StartListening]`.
    #[must_use]
    pub fn standard() -> Self {
        Self::new().register_routes().start_listening()
    }

    /// Builds a sequence from explicit steps.
    #[must_use]
    pub fn from_steps(steps: Vec<SetupStep>) -> Self {
        Self { steps }
    }

    /// Appends application middleware.
    #[must_use]
    pub fn middleware<M: archrest_middleware::Middleware>(mut self, middleware: M) -> Self {
        self.steps.push(SetupStep::Middleware(Arc::new(middleware)));
        self
    }

    /// Appends already boxed middleware.
    #[must_use]
    pub fn boxed_middleware(mut self, middleware: BoxedMiddleware) -> Self {
        self.steps.push(SetupStep::Middleware(middleware));
        self
    }

    /// Appends the register-routes marker.
    #[must_use]
    pub fn register_routes(mut self) -> Self {
        self.steps.push(SetupStep::RegisterRoutes);
        self
    }

    /// Appends the start-listening marker.
    #[must_use]
    pub fn start_listening(mut self) -> Self {
        self.steps.push(SetupStep::StartListening);
        self
    }

    /// The steps in order.
    #[must_use]
    pub fn steps(&self) -> &[SetupStep] {
        &self.steps
    }

    /// Checks the markers and splits middleware around the register marker.
    ///
    /// Middleware declared after `StartListening` is still applied after the
    /// routes.
    ///
    /// # Errors
    ///
    /// Returns `MissingMarker`, `DuplicateMarker` or `MarkerOrder`.
    pub fn validate(&self) -> ServerResult<SequencePlan> {
        let position = |marker: SequenceMarker| -> ServerResult<usize> {
            let mut found = self.steps.iter().enumerate().filter(|(_, step)| {
                matches!(
                    (marker, step),
                    (SequenceMarker::RegisterRoutes, SetupStep::RegisterRoutes)
                        | (SequenceMarker::StartListening, SetupStep::StartListening)
                )
            });
            let (index, _) = found.next().ok_or(ServerError::MissingMarker(marker))?;
            if found.next().is_some() {
                return Err(ServerError::DuplicateMarker(marker));
            }
            Ok(index)
        };

        let register = position(SequenceMarker::RegisterRoutes)?;
        let listen = position(SequenceMarker::StartListening)?;
        if listen < register {
            return Err(ServerError::MarkerOrder);
        }

        let middleware = |steps: &[SetupStep]| -> Vec<BoxedMiddleware> {
            steps
                .iter()
                .filter_map(|step| match step {
                    SetupStep::Middleware(m) => Some(Arc::clone(m)),
                    _ => None,
                })
                .collect()
        };

        Ok(SequencePlan {
            before_routes: middleware(&self.steps[..register]),
            after_routes: middleware(&self.steps[register + 1..]),
        })
    }
}

/// Middleware split around the routes.
#[derive(Clone, Default)]
pub struct SequencePlan {
    /// Applied before any route.
    pub before_routes: Vec<BoxedMiddleware>,
    /// Applied to requests no route answered.
    pub after_routes: Vec<BoxedMiddleware>,
}

impl fmt::Debug for SequencePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = |list: &[BoxedMiddleware]| list.iter().map(|m| m.name()).collect::<Vec<_>>();
        f.debug_struct("SequencePlan")
            .field("before_routes", &names(&self.before_routes))
            .field("after_routes", &names(&self.after_routes))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archrest_middleware::{FnMiddleware, Middleware};

    fn named(name: &'static str) -> impl Middleware {
        FnMiddleware::new(name, |ctx, request, next| {
            Box::pin(async move { next.run(ctx, request).await })
        })
    }

    fn names(list: &[BoxedMiddleware]) -> Vec<&'static str> {
        list.iter().map(|m| m.name()).collect()
    }

    #[test]
    fn test_standard_sequence() {
        let plan = Sequence::standard().validate().unwrap();
        assert!(plan.before_routes.is_empty());
        assert!(plan.after_routes.is_empty());
    }

    #[test]
    fn test_split_around_register_marker() {
        let plan = Sequence::new()
            .middleware(named("cors"))
            .middleware(named("json"))
            .register_routes()
            .middleware(named("fallback"))
            .start_listening()
            .middleware(named("late"))
            .validate()
            .unwrap();

        assert_eq!(names(&plan.before_routes), vec!["cors", "json"]);
        assert_eq!(names(&plan.after_routes), vec!["fallback", "late"]);
    }

    #[test]
    fn test_missing_register_routes() {
        let err = Sequence::new().start_listening().validate().unwrap_err();
        assert!(matches!(
            err,
            ServerError::MissingMarker(SequenceMarker::RegisterRoutes)
        ));
    }

    #[test]
    fn test_missing_start_listening() {
        let err = Sequence::new()
            .middleware(named("json"))
            .register_routes()
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ServerError::MissingMarker(SequenceMarker::StartListening)
        ));
    }

    #[test]
    fn test_duplicate_marker() {
        let err = Sequence::standard().register_routes().validate().unwrap_err();
        assert!(matches!(
            err,
            ServerError::DuplicateMarker(SequenceMarker::RegisterRoutes)
        ));
    }

    #[test]
    fn test_marker_order() {
        let err = Sequence::new()
            .start_listening()
            .register_routes()
            .validate()
            .unwrap_err();
        assert!(matches!(err, ServerError::MarkerOrder));
    }

    #[test]
    fn test_from_steps_debug() {
        let sequence = Sequence::from_steps(vec![
            SetupStep::Middleware(Arc::new(named("json"))),
            SetupStep::RegisterRoutes,
            SetupStep::StartListening,
        ]);
        assert_eq!(sequence.steps().len(), 3);
        assert_eq!(
            format!("{:?}", sequence.steps()[0]),
            "Middleware(\"json\")"
        );
    }
}
