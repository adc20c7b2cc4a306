pub mod device;
pub mod mock_webhook;
