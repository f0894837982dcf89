use validator::ValidateEmail;

#[derive(Debug, Clone, PartialEq, Eq)]
/// An address that passed `validator`'s email check. Only ever built with
/// `SubscriberEmail::parse`, so anything holding one can hand it straight to
/// Mailchimp.
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        // surrounding whitespace is a copy-paste artifact, not part of the address
        let email = email.trim().to_string();
        ValidateEmail::validate_email(&email)
            .then_some(Self(email.clone()))
            .ok_or(format!("Invalid email: {email:?}"))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
