// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

//! Regular expression fragments for the log grammars the format
//! wrappers recognize.  Patterns are built up from small named pieces
//! so each grammar reads like its documentation.

// Dates and times.

pub const DAY_OF_MONTH: &str = r"[0-3]\d";
pub const MONTH: &str = r"[012]\d";
pub const YEAR: &str = r"\d{4}";
pub const HOUR: &str = r"[012]\d";
pub const MINUTE: &str = r"[0-5]\d";
pub const SECOND: &str = r"[0-6]\d";

pub const SHORT_MONTH_NAME: &str = r"[ADFJMNOS][aceopu][bcglnprtvy]";

// Networking.

const IPV4_OCTET: &str = r"(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)";

pub const HTTP_STATUS_CODE: &str = r"\d{3}";

// https://nginx.org/en/docs/ngx_core_module.html#error_log
pub const NGINX_ERROR_LOG_LEVEL: &str =
  "debug|info|notice|warn|error|crit|alert|emerg";

// https://github.com/nginx/nginx/blob/master/src/core/ngx_log.c#L107
pub const NGINX_PID_TID_CONN: &str =
  r"(?P<pid>\d+)#(?P<tid>\d+):(?: \*(?P<conn>\d+))?";

pub const NGINX_KEY_VALUE_PAIR: &str =
  r#"(?P<key>[a-z]+): (?P<value>[^"].*?|".*?")"#;

lazy_static! {
  pub static ref SLASH_DATE_YYYY_MM_DD: String =
    format!("{}/{}/{}", YEAR, MONTH, DAY_OF_MONTH);

  pub static ref SLASH_DATE_DD_BBB_YYYY: String =
    format!("{}/{}/{}", DAY_OF_MONTH, SHORT_MONTH_NAME, YEAR);

  pub static ref COLON_TIME_HH_MM_SS: String =
    format!("{}:{}:{}", HOUR, MINUTE, SECOND);

  pub static ref ZONE: String =
    format!(r"[+-][01]\d{}", MINUTE);

  /// Timestamps as found in common/combined format httpd access logs,
  /// e.g. `02/Sep/2024:10:00:31 +0100`.
  pub static ref COMMON_LOG_TIMESTAMP: String = format!(
    "{}:{} {}",
    *SLASH_DATE_DD_BBB_YYYY, *COLON_TIME_HH_MM_SS, *ZONE
  );

  pub static ref IPV4_ADDR: String =
    format!(r"{}(?:\.{}){{3}}", IPV4_OCTET, IPV4_OCTET);

  pub static ref NGINX_ERROR_LOG_TIMESTAMP: String =
    format!("{} {}", *SLASH_DATE_YYYY_MM_DD, *COLON_TIME_HH_MM_SS);

  pub static ref NGINX_ERROR_LOG_ENTRY: String = format!(
    r"^(?P<time>{}) \[(?P<level>{})\] {} (?P<message>.*)$",
    *NGINX_ERROR_LOG_TIMESTAMP, NGINX_ERROR_LOG_LEVEL, NGINX_PID_TID_CONN
  );

  /// One trailing field at the end of an Nginx error log message,
  /// e.g. `, client: 216.213.58.42` or `, host: "example.net"`.
  pub static ref NGINX_TRAILING_FIELD: String = format!(
    "^(?P<message>.*), {}$",
    NGINX_KEY_VALUE_PAIR
  );

  pub static ref PHP_FPM_ACCESS_LOG_ENTRY: String = format!(
    concat!(
      r"^(?P<remote_addr>{})",
      r" -",
      r" (?P<remote_user>\S+)",
      r" (?P<timestamp>{})",
      r#" "(?P<method>\S+)"#,
      r" (?P<request_uri>/.*)",
      r#"" (?P<status>{})$"#
    ),
    *IPV4_ADDR, *COMMON_LOG_TIMESTAMP, HTTP_STATUS_CODE
  );
}
