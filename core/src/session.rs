/// Holds the uid of the logged-in node, if any.
///
/// Schema projections substitute this uid into boolean-edge visibility
/// filters; with no login those edges are omitted from the projection.
#[derive(Clone, Debug, Default)]
pub struct Session {
    login_uid: Option<String>,
}

impl Session {
    pub fn login(&mut self, uid: impl Into<String>) {
        self.login_uid = Some(uid.into());
    }

    pub fn logout(&mut self) {
        self.login_uid = None;
    }

    pub fn login_uid(&self) -> Option<&str> {
        self.login_uid.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.login_uid.is_some()
    }
}
