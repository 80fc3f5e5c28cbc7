/*
 * Responsibility
 * - 永続化層の公開インターフェース
 * - 各 repo は trait + Pg 実装 (テストでは memory 実装に差し替え)
 */
pub mod blog_repo;
pub mod db;
pub mod error;
pub mod recommendation_repo;
pub mod subscriber_repo;

#[cfg(test)]
pub mod memory;
