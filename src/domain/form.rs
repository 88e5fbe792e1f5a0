/// A `submit` event raised by the payment form.
///
/// Mirrors the browser event: the default action (navigating to the form's
/// action URL) happens unless a handler calls [`SubmitEvent::prevent_default`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitEvent {
    form_id: String,
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new(form_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            default_prevented: false,
        }
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
