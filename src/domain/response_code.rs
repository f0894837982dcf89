//! Numeric member-lookup codes returned by Mailchimp, and what we do about
//! them. Codes are matched by value only; the accompanying message is never
//! inspected.

/// Email_AlreadySubscribed
pub const MEMBER_EXISTS: u16 = 230;
/// Email_AlreadyUnsubscribed
pub const MEMBER_UNSUBSCRIBED: u16 = 231;
/// Email_NotExists
pub const MEMBER_NOT_FOUND: u16 = 232;
/// Email_NotSubscribed
pub const MEMBER_NOT_SUBSCRIBED: u16 = 233;

/// Codes after which a subscribe write is issued
pub const SUBSCRIBE_ELIGIBLE: [u16; 3] = [MEMBER_UNSUBSCRIBED, MEMBER_NOT_FOUND, MEMBER_NOT_SUBSCRIBED];

/// An address Mailchimp has never seen must confirm via the opt-in email
pub const DOUBLE_OPT_IN: u16 = MEMBER_NOT_FOUND;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupVerdict {
    AlreadySubscribed,
    Eligible { double_opt_in: bool },
    Unexpected,
}

/// Evaluated in a fixed order: exists, then eligible, then fallback
pub fn interpret(code: u16) -> LookupVerdict {
    if code == MEMBER_EXISTS {
        LookupVerdict::AlreadySubscribed
    } else if SUBSCRIBE_ELIGIBLE.contains(&code) {
        LookupVerdict::Eligible {
            double_opt_in: code == DOUBLE_OPT_IN,
        }
    } else {
        LookupVerdict::Unexpected
    }
}
