/*
 * Responsibility
 * - 全ルート共通の layer (http: request id / trace / 制限, cors, security_headers)
 * - 重ねる順番は app::build_router が持つ
 */
pub mod cors;
pub mod http;
pub mod security_headers;
