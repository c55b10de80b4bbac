pub mod checkout;
pub mod normalize;

pub use checkout::{CreatePixRequest, CreatePixResponse, create_pix_charge};
pub use normalize::{
    PAID_STATUSES, WebhookCustomer, extract_amount, extract_customer, extract_status,
    extract_transaction_id, is_paid_status, organic_fallback, usable_tracking,
};
