// db/messagedb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::messagemodel::{Conversation, Message};

#[async_trait]
pub trait MessageExt {
    async fn send_message(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        body: String,
    ) -> Result<Message, sqlx::Error>;

    /// Messages exchanged between the two users, newest first.
    async fn get_conversation(
        &self,
        user_id: Uuid,
        other_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, sqlx::Error>;

    async fn get_inbox(&self, user_id: Uuid) -> Result<Vec<Conversation>, sqlx::Error>;

    /// Marks everything `other_id` sent to `user_id` as read.
    async fn mark_conversation_read(&self, user_id: Uuid, other_id: Uuid) -> Result<u64, sqlx::Error>;

    async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;
}

#[async_trait]
impl MessageExt for DBClient {
    async fn send_message(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        body: String,
    ) -> Result<Message, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (sender_id, recipient_id, body)
            VALUES ($1, $2, $3)
            RETURNING id, sender_id, recipient_id, body, is_read, read_at, created_at
            "#,
        )
        .bind(sender_id)
        .bind(recipient_id)
        .bind(body)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_conversation(
        &self,
        user_id: Uuid,
        other_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, sender_id, recipient_id, body, is_read, read_at, created_at
            FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(other_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_inbox(&self, user_id: Uuid) -> Result<Vec<Conversation>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(
            r#"
            WITH pairs AS (
                SELECT CASE WHEN sender_id = $1 THEN recipient_id ELSE sender_id END AS counterpart_id,
                       body, created_at, recipient_id, is_read
                FROM messages
                WHERE sender_id = $1 OR recipient_id = $1
            ),
            latest AS (
                SELECT DISTINCT ON (counterpart_id) counterpart_id, body, created_at
                FROM pairs
                ORDER BY counterpart_id, created_at DESC
            ),
            unread AS (
                SELECT counterpart_id, COUNT(*) AS unread_count
                FROM pairs
                WHERE recipient_id = $1 AND is_read = FALSE
                GROUP BY counterpart_id
            )
            SELECT l.counterpart_id, u.name AS counterpart_name, l.body AS last_message,
                   l.created_at AS last_message_at, COALESCE(un.unread_count, 0) AS unread_count
            FROM latest l
            JOIN users u ON u.id = l.counterpart_id
            LEFT JOIN unread un ON un.counterpart_id = l.counterpart_id
            ORDER BY l.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_conversation_read(&self, user_id: Uuid, other_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = TRUE, read_at = NOW()
            WHERE recipient_id = $1 AND sender_id = $2 AND is_read = FALSE
            "#,
        )
        .bind(user_id)
        .bind(other_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn get_unread_count(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}
