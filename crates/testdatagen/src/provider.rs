/// An external source of candidate identity numbers.
///
/// Implementations typically wrap a fake-data library whose notion of a
/// "valid" national identity number is an opaque string such as
/// `811218-9876`. The sampler normalizes each candidate through
/// [`decode`](crate::decode) and rejects the ones outside the requested
/// window.
///
/// Each batch worker owns its own clone, so implementations need not be
/// `Sync`.
///
/// # Example
///
/// ```
/// use testdatagen::PersonAttributeProvider;
///
/// #[derive(Clone)]
/// struct Fixed;
/// impl PersonAttributeProvider for Fixed {
///     fn raw_identity_number(&mut self) -> Option<String> {
///         Some("811218-9876".to_owned())
///     }
/// }
///
/// assert_eq!(Fixed.raw_identity_number().as_deref(), Some("811218-9876"));
/// ```
pub trait PersonAttributeProvider: Send {
    /// Returns a raw candidate, or `None` if the source cannot supply one
    /// right now. `None` makes the sampler synthesize that draw itself.
    fn raw_identity_number(&mut self) -> Option<String>;
}

impl<P: PersonAttributeProvider + ?Sized> PersonAttributeProvider for Box<P> {
    fn raw_identity_number(&mut self) -> Option<String> {
        (**self).raw_identity_number()
    }
}

/// A provider that never supplies candidates, which keeps the sampler in
/// pure-synthesis mode.
#[derive(Default, Clone, Copy, Debug)]
pub struct Synthetic;

impl PersonAttributeProvider for Synthetic {
    fn raw_identity_number(&mut self) -> Option<String> {
        None
    }
}
