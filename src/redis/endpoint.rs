//! Redis主機字串解析
//!
//! 支援的寫法：
//! - `host`、`host:port`
//! - `password@host:port`
//! - `[ipv6]`、`[ipv6]:port`
//! - `redis://...` 或 `rediss://...`（原樣使用）

use super::pool::RedisPoolError;
use std::borrow::Cow;
use std::fmt;

/// Redis預設端口
pub const DEFAULT_PORT: u16 = 6379;

/// 單一Redis主機
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedisEndpoint {
    /// 由主機字串解析而來
    Host {
        host: String,
        port: u16,
        password: Option<String>,
        db: i64,
    },
    /// 完整 URL，不做任何改寫
    Url(String),
}

impl RedisEndpoint {
    /// 解析主機字串，`db` 只套用在非 URL 的寫法
    pub fn parse(raw: &str, db: i64) -> Result<Self, RedisPoolError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RedisPoolError::InvalidHost("主機字串為空".to_string()));
        }

        if ["redis://", "rediss://", "redis+unix://"]
            .iter()
            .any(|scheme| raw.starts_with(scheme))
        {
            return Ok(RedisEndpoint::Url(raw.to_string()));
        }

        // 密碼本身可能含有 '@'，以最後一個為準
        let (password, address) = match raw.rsplit_once('@') {
            Some((password, address)) if !password.is_empty() => {
                (Some(password.to_string()), address)
            }
            Some((_, address)) => (None, address),
            None => (None, raw),
        };

        let (host, port) = split_host_port(address, raw)?;

        if host.is_empty() {
            return Err(RedisPoolError::InvalidHost(format!("缺少主機名稱: {}", raw)));
        }

        Ok(RedisEndpoint::Host {
            host: host.to_string(),
            port,
            password,
            db,
        })
    }

    /// 轉為 redis crate 可用的連接 URL
    pub fn to_url(&self) -> String {
        match self {
            RedisEndpoint::Url(url) => url.clone(),
            RedisEndpoint::Host {
                host,
                port,
                password: Some(password),
                db,
            } => format!(
                "redis://:{}@{}:{}/{}",
                encode_userinfo(password),
                bracket_ipv6(host),
                port,
                db
            ),
            RedisEndpoint::Host {
                host,
                port,
                password: None,
                db,
            } => format!("redis://{}:{}/{}", bracket_ipv6(host), port, db),
        }
    }
}

/// 日誌中使用，不輸出密碼
impl fmt::Display for RedisEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedisEndpoint::Url(url) => match url.rsplit_once('@') {
                Some((scheme_and_auth, rest)) => {
                    let scheme = scheme_and_auth.split("://").next().unwrap_or("redis");
                    write!(f, "{}://***@{}", scheme, rest)
                }
                None => write!(f, "{}", url),
            },
            RedisEndpoint::Host { host, port, db, .. } => {
                write!(f, "{}:{}/{}", bracket_ipv6(host), port, db)
            }
        }
    }
}

/// 將主機列表字串依任一分隔字元拆開，並去除空白項
pub fn split_server_hosts(server_hosts: &str, separators: &str) -> Vec<String> {
    server_hosts
        .split(|c: char| separators.contains(c))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 解析配置中的主機列表，每一項可再包含以 `,` 或 `;` 分隔的多台主機
pub fn parse_hosts<S: AsRef<str>>(
    hosts: &[S],
    db: i64,
) -> Result<Vec<RedisEndpoint>, RedisPoolError> {
    hosts
        .iter()
        .flat_map(|entry| split_server_hosts(entry.as_ref(), ",;"))
        .map(|host| RedisEndpoint::parse(&host, db))
        .collect()
}

// IPv6 位址必須寫成 `[addr]` 或 `[addr]:port`
fn split_host_port<'a>(address: &'a str, raw: &str) -> Result<(&'a str, u16), RedisPoolError> {
    let invalid_port = || RedisPoolError::InvalidHost(format!("無效的端口: {}", raw));

    if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| {
            RedisPoolError::InvalidHost(format!("IPv6 位址缺少 ']': {}", raw))
        })?;
        let port = match tail {
            "" => DEFAULT_PORT,
            tail => tail
                .strip_prefix(':')
                .and_then(|port| port.parse::<u16>().ok())
                .ok_or_else(invalid_port)?,
        };
        return Ok((host, port));
    }

    if address.matches(':').count() > 1 {
        return Err(RedisPoolError::InvalidHost(format!(
            "IPv6 位址需以方括號包住: {}",
            raw
        )));
    }

    match address.split_once(':') {
        Some((host, port)) => Ok((host, port.parse::<u16>().map_err(|_| invalid_port())?)),
        None => Ok((address, DEFAULT_PORT)),
    }
}

fn bracket_ipv6(host: &str) -> Cow<'_, str> {
    if host.contains(':') {
        Cow::Owned(format!("[{}]", host))
    } else {
        Cow::Borrowed(host)
    }
}

// URL userinfo 中的保留字元需百分比編碼
fn encode_userinfo(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("localhost", "redis://localhost:6379/0")]
    #[case("localhost:6380", "redis://localhost:6380/0")]
    #[case("123456@localhost:6379", "redis://:123456@localhost:6379/0")]
    #[case("p@ss@10.0.0.1:7000", "redis://:p%40ss@10.0.0.1:7000/0")]
    #[case("@localhost:6379", "redis://localhost:6379/0")]
    #[case("redis://user:pw@cache:6379/2", "redis://user:pw@cache:6379/2")]
    #[case("[::1]:6380", "redis://[::1]:6380/0")]
    #[case("pw@[fe80::2]", "redis://:pw@[fe80::2]:6379/0")]
    fn test_parse_to_url(#[case] raw: &str, #[case] expected: &str) {
        let endpoint = RedisEndpoint::parse(raw, 0).expect("解析主機失敗");
        assert_eq!(endpoint.to_url(), expected);
    }

    #[test]
    fn test_parse_applies_db() {
        let endpoint = RedisEndpoint::parse("secret@cache:6379", 4).expect("解析主機失敗");
        assert_eq!(
            endpoint,
            RedisEndpoint::Host {
                host: "cache".to_string(),
                port: 6379,
                password: Some("secret".to_string()),
                db: 4,
            }
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("localhost:notaport")]
    #[case("pw@:6379")]
    #[case("::1")]
    #[case("fe80::2:6379")]
    #[case("[::1")]
    #[case("[::1]6379")]
    #[case("[]:6379")]
    fn test_parse_rejects_invalid(#[case] raw: &str) {
        assert_matches!(
            RedisEndpoint::parse(raw, 0),
            Err(RedisPoolError::InvalidHost(_))
        );
    }

    #[test]
    fn test_display_hides_password() {
        let endpoint = RedisEndpoint::parse("secret@cache:6379", 0).expect("解析主機失敗");
        assert_eq!(endpoint.to_string(), "cache:6379/0");

        let endpoint =
            RedisEndpoint::parse("redis://:secret@cache:6379", 0).expect("解析主機失敗");
        assert_eq!(endpoint.to_string(), "redis://***@cache:6379");

        let endpoint = RedisEndpoint::parse("secret@[::1]:6379", 0).expect("解析主機失敗");
        assert_eq!(endpoint.to_string(), "[::1]:6379/0");
    }

    #[test]
    fn test_split_server_hosts() {
        let hosts = split_server_hosts("a@h1:6379, h2:6380;;h3", ",;");
        assert_eq!(hosts, vec!["a@h1:6379", "h2:6380", "h3"]);
        assert!(split_server_hosts(" , ", ",").is_empty());
    }

    #[test]
    fn test_parse_hosts_flattens_entries() {
        let entries = vec!["h1:6379,h2:6379".to_string(), "h3".to_string()];
        let endpoints = parse_hosts(&entries, 1).expect("解析主機列表失敗");
        assert_eq!(endpoints.len(), 3);
        assert_eq!(endpoints[2].to_url(), "redis://h3:6379/1");
    }
}
