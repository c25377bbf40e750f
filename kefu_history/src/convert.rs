use kefu_core::Exchange;
use kefu_entities::exchanges;
use sea_orm::Set;

pub fn exchange_from_model(m: exchanges::Model) -> Exchange {
    Exchange {
        id: m.id,
        user_id: m.user_id,
        platform: m.platform,
        user_message: m.user_message,
        assistant_message: m.assistant_message,
        timestamp: m.created_at.and_utc(),
    }
}

pub fn active_model_from_exchange(e: &Exchange) -> exchanges::ActiveModel {
    exchanges::ActiveModel {
        id: Set(e.id),
        user_id: Set(e.user_id.clone()),
        platform: Set(e.platform.clone()),
        user_message: Set(e.user_message.clone()),
        assistant_message: Set(e.assistant_message.clone()),
        created_at: Set(e.timestamp.naive_utc()),
    }
}
