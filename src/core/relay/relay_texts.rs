// User-facing texts of the relay.
//
// Kept in one place so the relay logic reads as decisions, not string
// formatting. User text embedded in a Markdown message goes through
// `escape_markdown` first. Inside a `*bold*` span escapes are not processed,
// so names placed there are left as they are.

use super::relay_models::UserId;

pub const WELCOME: &str = "\
✨ *Это — поддержка беседы \"БРЕДИМ\"* ✨

📝 Здесь ты можешь задать свой вопрос, а наши модераторы ответят в кратчайшие сроки.

🌟 *Просто напиши свой вопрос, и мы обязательно свяжемся с тобой!*

📩 *Жду твоего сообщения!*";

pub const REPLY_INSTRUCTION: &str =
    "Пожалуйста, отвечайте на сообщение, содержащее вопрос, используя reply.";
pub const ANSWER_FAILED: &str = "Не удалось отправить сообщение пользователю. Возможно, он заблокировал бота или не начал чат.";
pub const QUESTION_ACCEPTED: &str = "Ваш вопрос отправлен модераторам. Ожидайте ответа.";
pub const QUESTION_FAILED: &str = "Произошла ошибка при отправке вопроса.";
pub const HANDLE_NOT_FOUND: &str = "Не удалось найти пользователя с таким username.";
pub const INVALID_USER_ID: &str = "Некорректный user_id.";
pub const NOT_BLOCKED: &str = "Этот пользователь не заблокирован.";

/// Escape characters that legacy Markdown would interpret.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Annotated question posted into the moderation group (Markdown).
///
/// `display_name` sits inside the bold span and is not escaped. Telegram
/// usernames only contain letters, digits and `_`, and a `_` inside a bold
/// entity is plain text.
pub fn question(requester: UserId, display_name: &str, text: &str) -> String {
    format!(
        "❓ *Вопрос от пользователя {} {}:*\n{}",
        requester,
        display_name,
        escape_markdown(text)
    )
}

/// Moderator answer delivered to the requester (Markdown).
pub fn answer(text: &str) -> String {
    format!("📝 *Ответ от модератора:*\n{}", escape_markdown(text))
}

pub fn answer_delivered(requester: UserId, display_name: &str) -> String {
    format!("Ответ отправлен пользователю {} {}", requester, display_name)
}

pub fn usage(command: &str) -> String {
    format!(
        "Используйте /{} @username или /{} user_id",
        command, command
    )
}

pub fn banned(target: &str) -> String {
    format!(
        "Пользователь {} заблокирован. Он больше не сможет задавать вопросы.",
        target
    )
}

pub fn unbanned(target: &str) -> String {
    format!(
        "Пользователь {} разблокирован. Теперь он сможет задавать вопросы.",
        target
    )
}
