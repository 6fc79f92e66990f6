//! コーパス収集とテキスト処理の共通部品。
pub mod partial_success;
pub mod text;
