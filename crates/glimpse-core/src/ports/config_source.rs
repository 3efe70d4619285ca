//! ConfigSource port - 設定値の参照

/// ConfigSource はジョブ URL の接頭辞を提供
///
/// 設定は実行中に差し替わりうるので、解決のたびに読み直す。
pub trait ConfigSource: Send + Sync {
    fn job_url_prefix(&self) -> String;
}
