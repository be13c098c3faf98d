//! 进程启动参数读取
//!
//! 把原始命令行按 "键 值" 成对读入一个进程级映射。
//! 若应用不遵循键值对约定，需要自备解析器。

use once_cell::sync::Lazy;
use std::collections::HashMap;

static ARGS: Lazy<HashMap<String, String>> = Lazy::new(|| {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    parse(&raw)
});

/// 读取完整的参数映射
pub fn read() -> &'static HashMap<String, String> {
    &ARGS
}

/// 判断参数是否存在
pub fn exists(key: &str) -> bool {
    ARGS.contains_key(key)
}

/// 按键读取参数值
///
/// 键存在但无后随值时返回空字符串
pub fn try_get(key: &str) -> Option<&'static str> {
    ARGS.get(key).map(String::as_str)
}

/// 成对读取参数列表
///
/// 奇数位置为键，偶数位置为值；末尾落单的键取空字符串
fn parse(args: &[String]) -> HashMap<String, String> {
    let mut parsed = HashMap::with_capacity(args.len() / 2 + 1);
    let mut index = 0;
    while index < args.len() {
        let key = args[index].clone();
        let value = args.get(index + 1).cloned().unwrap_or_default();
        parsed.insert(key, value);
        index += 2;
    }
    parsed
}
