/*
 * Responsibility
 * - title → slug の変換
 * - lowercase → [a-z0-9] 以外の連続を 1 つの '-' に → 先頭/末尾の '-' を除去
 * - 非 ASCII 文字は変換せず区切りとして扱う
 */

pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
