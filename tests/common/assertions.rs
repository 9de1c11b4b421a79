//! 自定义断言辅助模块
//!
//! 提供测试中的常用断言函数

use chcodec::core::codec::CodecError;

/// 断言结果成功，返回内部值
pub fn assert_ok<T, E: std::fmt::Debug>(result: Result<T, E>) -> T {
    result.expect("操作应该成功")
}

/// 断言结果失败并匹配错误消息
pub fn assert_err_with<T: std::fmt::Debug, E: std::fmt::Display>(result: Result<T, E>, expected_msg: &str) {
    let err = result.expect_err("操作应该失败");
    let err_str = err.to_string();
    assert!(
        err_str.contains(expected_msg),
        "错误消息应包含 '{}', 实际是 '{}'",
        expected_msg,
        err_str
    );
}

/// 断言失败且剥去列上下文后的错误满足条件
pub fn assert_root_err<T, F>(result: Result<T, CodecError>, predicate: F)
where
    F: FnOnce(&CodecError) -> bool,
{
    let Err(err) = result else {
        panic!("操作应该失败");
    };
    assert!(predicate(err.root()), "错误类型不符合预期: {:?}", err);
}

/// 断言字节序列相同，失败时以十六进制输出
pub fn assert_bytes(actual: &[u8], expected: &[u8]) {
    assert!(
        actual == expected,
        "字节不匹配:\n  期望 {}\n  实际 {}",
        hex(expected),
        hex(actual)
    );
}

pub fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
