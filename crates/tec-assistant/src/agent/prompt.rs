//! Transcript construction for the assistant persona

use crate::image::ImageInput;
use crate::types::{ChatMessage, Role};

/// Persona and house rules for Tec
pub const SYSTEM_PROMPT: &str = "أنت Tec 🤖، مساعد ذكي في جامعة عمان العربية.
- اجب على الأسئلة بناءً على السياق السابق للمحادثة
- إذا تم إرسال صورة، قم بتحليلها وأجب على السؤال بناءً على محتوى الصورة
- استخدم أداة البحث في قاعدة المعرفة للإجابة عن أسئلة الجامعة
- كن ودياً واحترافياً
- استخدم الإيموجي بشكل مناسب
- حاول الإجابة على الأسئلة بشكل مباشر قدر الإمكان";

/// Builds the message list for the first completion call
pub struct PromptBuilder;

impl PromptBuilder {
    /// System prompt, replayed history, then the new user turn
    ///
    /// Only user and assistant turns from `history` are replayed; system and
    /// tool messages from earlier exchanges are dropped.
    pub fn transcript(history: &[ChatMessage], message: &str, image: Option<&ImageInput>) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));

        messages.extend(
            history
                .iter()
                .filter(|m| matches!(m.role, Role::User | Role::Assistant))
                .filter(|m| m.content.is_some())
                .map(|m| ChatMessage {
                    tool_calls: Vec::new(),
                    tool_call_id: None,
                    name: None,
                    ..m.clone()
                }),
        );

        messages.push(Self::user_turn(message, image));
        messages
    }

    /// User turn; multi-part when an image is attached
    pub fn user_turn(message: &str, image: Option<&ImageInput>) -> ChatMessage {
        match image {
            Some(image) => ChatMessage::user_with_image(message, image.to_data_url()),
            None => ChatMessage::user(message),
        }
    }
}
