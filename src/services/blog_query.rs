/*
 * Responsibility
 * - GET /blog の一覧: published のみ / 検索 / starred 絞り込み / ページング
 * - curated (starred) サイドリストは 1 ページ目・検索なし・starred 指定なしの時だけ
 * - 件数 / 一覧 / curated の 3 クエリは並行に実行
 */
use serde::{Deserialize, Serialize};

use crate::repos::{
    blog_repo::{BlogFilter, BlogRepo, BlogRow},
    error::RepoError,
};

pub const POSTS_PER_PAGE: i64 = 20;
pub const CURATED_LIMIT: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogListQuery {
    pub page: i64,
    pub search: String,
    pub starred_only: bool,
}

impl Default for BlogListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            search: String::new(),
            starred_only: false,
        }
    }
}

impl BlogListQuery {
    /// Lenient parse of raw query values: bad or missing page falls back to 1.
    pub fn from_params(page: Option<&str>, search: Option<&str>, starred: Option<&str>) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let search = search.map(str::trim).unwrap_or_default().to_string();
        let starred_only = starred.is_some_and(|s| s.eq_ignore_ascii_case("true"));

        Self {
            page,
            search,
            starred_only,
        }
    }

    pub fn wants_curated(&self) -> bool {
        self.page == 1 && self.search.is_empty() && !self.starred_only
    }

    /// Search results are always computed fresh.
    pub fn is_cacheable(&self) -> bool {
        self.search.is_empty()
    }

    fn filter(&self) -> BlogFilter {
        BlogFilter {
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            starred_only: self.starred_only,
        }
    }

    fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(POSTS_PER_PAGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_posts: i64,
    pub posts_per_page: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(current_page: i64, total_posts: i64) -> Self {
        let total_posts = total_posts.max(0);
        let total_pages = (total_posts + POSTS_PER_PAGE - 1) / POSTS_PER_PAGE;

        Self {
            current_page,
            total_pages,
            total_posts,
            posts_per_page: POSTS_PER_PAGE,
            has_next_page: current_page < total_pages,
            has_prev_page: current_page > 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlogListing {
    pub posts: Vec<BlogRow>,
    pub curated: Vec<BlogRow>,
    pub pagination: Pagination,
}

pub async fn list_posts(
    repo: &dyn BlogRepo,
    query: &BlogListQuery,
) -> Result<BlogListing, RepoError> {
    let filter = query.filter();

    let curated = async {
        if query.wants_curated() {
            repo.list_curated(CURATED_LIMIT).await
        } else {
            Ok(Vec::new())
        }
    };

    let (total, posts, curated) = tokio::try_join!(
        repo.count_published(&filter),
        repo.list_published(&filter, POSTS_PER_PAGE, query.offset()),
        curated,
    )?;

    Ok(BlogListing {
        posts,
        curated,
        pagination: Pagination::new(query.page, total),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::repos::blog_repo::NewBlog;
    use crate::repos::memory::MemoryBlogRepo;

    fn seed(repo: &MemoryBlogRepo, n: usize) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for i in 0..n {
            repo.insert_at(
                NewBlog {
                    slug: format!("post-{i}"),
                    title: format!("Post {i}"),
                    description: if i % 3 == 0 {
                        "About Rust ownership".into()
                    } else {
                        "General notes".into()
                    },
                    content: "body".into(),
                    tags: if i % 4 == 0 {
                        vec!["Tokio".into()]
                    } else {
                        vec![]
                    },
                    external: None,
                    is_starred: i % 5 == 0,
                },
                base + Duration::hours(i as i64),
            );
        }
    }

    #[test]
    fn pagination_math_matches_ceiling_division() {
        for (total, pages) in [(0, 0), (1, 1), (20, 1), (21, 2), (40, 2), (41, 3)] {
            let p = Pagination::new(1, total);
            assert_eq!(p.total_pages, pages, "total={total}");
            assert_eq!(p.has_next_page, 1 < pages);
            assert!(!p.has_prev_page);
        }

        let last = Pagination::new(3, 41);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);
    }

    #[test]
    fn query_params_fall_back_to_defaults() {
        assert_eq!(
            BlogListQuery::from_params(None, None, None),
            BlogListQuery::default()
        );
        assert_eq!(BlogListQuery::from_params(Some("abc"), None, None).page, 1);
        assert_eq!(BlogListQuery::from_params(Some("-4"), None, None).page, 1);
        assert_eq!(BlogListQuery::from_params(Some("3"), None, None).page, 3);

        let q = BlogListQuery::from_params(None, Some("  rust  "), Some("true"));
        assert_eq!(q.search, "rust");
        assert!(q.starred_only);
        assert!(!q.is_cacheable());
    }

    #[test]
    fn curated_only_on_plain_first_page() {
        assert!(BlogListQuery::default().wants_curated());
        assert!(!BlogListQuery::from_params(Some("2"), None, None).wants_curated());
        assert!(!BlogListQuery::from_params(None, Some("x"), None).wants_curated());
        assert!(!BlogListQuery::from_params(None, None, Some("true")).wants_curated());
    }

    #[tokio::test]
    async fn first_page_has_twenty_newest_posts_and_five_curated() {
        let repo = MemoryBlogRepo::default();
        seed(&repo, 45);

        let listing = list_posts(&repo, &BlogListQuery::default()).await.unwrap();

        assert_eq!(listing.posts.len(), 20);
        assert_eq!(listing.posts[0].slug, "post-44");
        assert!(
            listing
                .posts
                .windows(2)
                .all(|w| w[0].created_at >= w[1].created_at)
        );
        assert_eq!(listing.pagination.total_pages, 3);
        assert_eq!(listing.pagination.total_posts, 45);

        assert_eq!(listing.curated.len(), 5);
        assert!(listing.curated.iter().all(|p| p.is_starred));
        assert_eq!(listing.curated[0].slug, "post-40");
    }

    #[tokio::test]
    async fn page_beyond_end_is_empty_not_error() {
        let repo = MemoryBlogRepo::default();
        seed(&repo, 5);

        let q = BlogListQuery::from_params(Some("9"), None, None);
        let listing = list_posts(&repo, &q).await.unwrap();

        assert!(listing.posts.is_empty());
        assert!(listing.curated.is_empty());
        assert_eq!(listing.pagination.current_page, 9);
        assert!(!listing.pagination.has_next_page);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_over_title_description_and_tags() {
        let repo = MemoryBlogRepo::default();
        seed(&repo, 12);

        let by_description = BlogListQuery::from_params(None, Some("OWNERSHIP"), None);
        let listing = list_posts(&repo, &by_description).await.unwrap();
        assert_eq!(listing.pagination.total_posts, 4);
        assert!(listing.curated.is_empty());

        let by_tag = BlogListQuery::from_params(None, Some("toK"), None);
        let listing = list_posts(&repo, &by_tag).await.unwrap();
        assert_eq!(listing.pagination.total_posts, 3);

        let by_title = BlogListQuery::from_params(None, Some("post 1"), None);
        let listing = list_posts(&repo, &by_title).await.unwrap();
        // post 1, post 10, post 11
        assert_eq!(listing.pagination.total_posts, 3);
    }

    #[tokio::test]
    async fn unpublished_posts_are_never_listed() {
        let repo = MemoryBlogRepo::default();
        seed(&repo, 3);
        repo.set_published("post-2", false);

        let listing = list_posts(&repo, &BlogListQuery::default()).await.unwrap();
        assert_eq!(listing.pagination.total_posts, 2);
        assert!(listing.posts.iter().all(|p| p.slug != "post-2"));
    }

    #[tokio::test]
    async fn starred_only_filters_posts() {
        let repo = MemoryBlogRepo::default();
        seed(&repo, 11);

        let q = BlogListQuery::from_params(None, None, Some("true"));
        let listing = list_posts(&repo, &q).await.unwrap();
        assert_eq!(listing.pagination.total_posts, 3);
        assert!(listing.posts.iter().all(|p| p.is_starred));
    }
}
