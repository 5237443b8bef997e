use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SendMessageDto {
    pub recipient_id: Uuid,

    #[validate(length(min = 1, max = 2000, message = "Message must be between 1 and 2000 characters"))]
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ConversationQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_is_rejected() {
        let dto = SendMessageDto { recipient_id: Uuid::new_v4(), body: String::new() };
        assert!(dto.validate().is_err());
    }
}
