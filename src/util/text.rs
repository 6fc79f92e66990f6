/// テキスト処理ユーティリティ。
use xxhash_rust::xxh3::Xxh3;

/// 文書列の XXH3 フィンガープリントを 16 進文字列で返す。
///
/// 文書は長さ接頭辞付きで投入するため、境界の異なる同一連結文字列は区別される。
#[must_use]
pub fn corpus_fingerprint<S: AsRef<str>>(documents: &[S]) -> String {
    let mut hasher = Xxh3::new();
    for document in documents {
        let bytes = document.as_ref().as_bytes();
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    format!("{:016x}", hasher.digest())
}
