//! 命令行入口
//!
//! 用法: `wechat-mp <命令> [参数]`
//!
//! | 命令 | 说明 |
//! |------|------|
//! | `token` | 获取 access_token |
//! | `ticket` | 获取 ticket |
//! | `sign <url>` | 生成 JS-SDK 签名 |
//! | `menu-get` | 查询自定义菜单 |
//! | `menu-delete` | 删除自定义菜单 |
//! | `menu-create <json文件>` | 按文件内容创建菜单 |
//!
//! 配置从环境变量 (或 `.env`) 读取,结果以JSON输出到 stdout。

use serde::Serialize;
use std::env;

use wechat_mp::utils::logger;
use wechat_mp::{Menu, RedisConfig, WechatClient, WechatConfig};

const USAGE: &str = "用法: wechat-mp <token | ticket | sign <url> | menu-get | menu-delete | menu-create <json文件>>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = env::var("WECHAT_LOG_DIR").unwrap_or_else(|_| logger::DEFAULT_LOG_DIR.to_string());
    let _guard = logger::init(log_dir)?;

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let client = WechatClient::connect(WechatConfig::from_env()?, &RedisConfig::from_env()?)?;

    match (command.as_str(), args.get(1)) {
        ("token", _) => print_json(&client.get_access_token().await?)?,
        ("ticket", _) => print_json(&client.get_ticket().await?)?,
        ("sign", Some(url)) => print_json(&client.sign(url).await?)?,
        ("menu-get", _) => print_json(&client.query_menu().await?)?,
        ("menu-delete", _) => {
            client.delete_menu().await?;
            print_json(&serde_json::json!({ "errcode": 0, "errmsg": "ok" }))?;
        }
        ("menu-create", Some(file)) => {
            let menu: Menu = serde_json::from_str(&std::fs::read_to_string(file)?)?;
            client.create_menu(&menu).await?;
            print_json(&serde_json::json!({ "errcode": 0, "errmsg": "ok" }))?;
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
