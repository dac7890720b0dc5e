/// Creates a single text [`Message`](crate::Message) from a role shorthand.
///
/// ```rust
/// use colloquy::{Role, cq_msg};
///
/// let message = cq_msg!(assistant => "Done.");
/// assert_eq!(message.role(), Role::Assistant);
/// assert_eq!(message.text_content(), "Done.");
/// ```
#[macro_export]
macro_rules! cq_msg {
    (system => $content:expr $(,)?) => {
        $crate::Message::text($crate::Role::System, $content)
    };
    (user => $content:expr $(,)?) => {
        $crate::Message::text($crate::Role::User, $content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Message::text($crate::Role::Assistant, $content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, or assistant; tool results need an id")
    };
}

/// Creates a `Vec<Message>` from role/content pairs.
///
/// ```rust
/// use colloquy::{Role, cq_messages};
///
/// let messages = cq_messages![
///     system => "You are concise.",
///     user => "Summarize this repository.",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role(), Role::System);
/// assert_eq!(messages[1].role(), Role::User);
/// ```
#[macro_export]
macro_rules! cq_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::cq_msg!($role => $content)),+]
    };
}

/// Creates a [`Session`](crate::Session) from role/content pairs.
///
/// Evaluates to `Result<Session, ValidationError>`.
///
/// ```rust
/// use colloquy::cq_session;
///
/// let session = cq_session![
///     system => "Be concise.",
///     user => "hi",
/// ]
/// .expect("session");
/// assert_eq!(session.len(), 2);
/// ```
#[macro_export]
macro_rules! cq_session {
    () => {
        ::std::result::Result::<$crate::Session, $crate::ValidationError>::Ok($crate::Session::new())
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        $crate::Session::new().append_all($crate::cq_messages![$($role => $content),+])
    };
}
