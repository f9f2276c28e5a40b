//! Callable values producing template text.

/// A named callable registered on the engine and surfaced through the
/// resolver chain.
///
/// When a section resolves to a lambda, `invoke` receives the rendered
/// body text; for a variable it receives an empty string. If
/// `interpolate_return_value` is true the returned text is compiled as a
/// one-off template and rendered in place, sharing the recursion budget
/// with partials.
pub trait Lambda: Send + Sync {
    fn invoke(&self, input: &str) -> String;

    fn interpolate_return_value(&self) -> bool {
        false
    }
}

/// Plain-function lambda whose return value is not re-interpolated.
impl<F> Lambda for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn invoke(&self, input: &str) -> String {
        self(input)
    }
}
