/// 计算 blake3 哈希
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// 配置文本的内容指纹（blake3，小写 hex）
pub fn fingerprint(text: &str) -> String {
    hex::encode(blake3_hash(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_stable() {
        let a = fingerprint("name: policy\n");
        assert_eq!(a, fingerprint("name: policy\n"));
        assert_ne!(a, fingerprint("name: other\n"));
        assert_eq!(a.len(), 64);
    }
}
