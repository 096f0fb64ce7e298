//! 房间状态存储
//!
//! 每个房间在数据目录下占一个子目录，记录按键名存为 JSON 文件。
//! 读取不到视为新房间，由调用方以默认记录补齐。

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// 存储管理器
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// 创建存储管理器，确保数据目录存在
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).with_context(|| format!("无法创建存储目录: {:?}", root))?;
        Ok(Self { root })
    }

    /// 读取指定房间指定键的内容；文件不存在返回 None
    pub fn load(&self, room: &str, key: &str) -> Result<Option<String>> {
        let path = self.path(room, key);
        if !path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&path).with_context(|| format!("读取文件失败: {:?}", path))?;
        Ok(Some(content))
    }

    /// 写入指定房间指定键的内容
    pub fn put(&self, room: &str, key: &str, content: &str) -> Result<()> {
        let dir = self.root.join(sanitize(room));
        fs::create_dir_all(&dir).with_context(|| format!("无法创建房间目录: {:?}", dir))?;
        let path = dir.join(format!("{}.json", key));
        fs::write(&path, content).with_context(|| format!("写入文件失败: {:?}", path))?;
        Ok(())
    }

    /// 读取并反序列化房间记录；缺失或损坏时返回默认值
    pub fn load_record<T>(&self, room: &str, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        match self.load(room, key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(record) => record,
                Err(e) => {
                    warn!(room, key, error = %e, "房间记录损坏，使用默认值");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                warn!(room, key, error = %e, "读取房间记录失败，使用默认值");
                T::default()
            }
        }
    }

    /// 序列化并写入房间记录
    pub fn put_record<T: Serialize>(&self, room: &str, key: &str, record: &T) -> Result<()> {
        let json = serde_json::to_string(record).context("序列化房间记录失败")?;
        self.put(room, key, &json)
    }

    fn path(&self, room: &str, key: &str) -> PathBuf {
        self.root.join(sanitize(room)).join(format!("{}.json", key))
    }
}

/// 清理房间名中不适合做目录名的字符
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
