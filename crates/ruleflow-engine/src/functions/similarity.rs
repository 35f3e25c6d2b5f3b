//! 字符串相似度
//!
//! 模糊匹配分数为 0..=100 的整数（按插入/删除距离归一化），
//! `similarity_score` 为 0.0..=1.0（基于编辑距离）。

use std::collections::BTreeSet;

/// 编辑距离（按字符计）
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// 1 - 编辑距离 / 较长串长度；两串均为空时为 1.0
pub fn similarity_score(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn ratio_chars(a: &[char], b: &[char]) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let total = (a.len() + b.len()) as f64;
    (200.0 * lcs_len(a, b) as f64 / total).round() as u32
}

/// 归一化插入/删除距离的相似度
pub fn ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

/// 较短串与较长串中同长度窗口的最佳匹配
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if shorter.is_empty() {
        return 0;
    }

    let mut best = 0;
    for window in longer.windows(shorter.len()) {
        best = best.max(ratio_chars(&shorter, window));
        if best == 100 {
            break;
        }
    }
    best
}

/// 小写化并把非字母数字字符替换为空格
fn process(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}

fn sorted_tokens(s: &str) -> String {
    let processed = process(s);
    let mut tokens: Vec<&str> = processed.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

pub fn token_sort_ratio(a: &str, b: &str) -> u32 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

pub fn token_set_ratio(a: &str, b: &str) -> u32 {
    let pa = process(a);
    let pb = process(b);
    if pa.is_empty() || pb.is_empty() {
        return 0;
    }

    let set_a: BTreeSet<&str> = pa.split_whitespace().collect();
    let set_b: BTreeSet<&str> = pb.split_whitespace().collect();

    let join = |tokens: Vec<&str>| tokens.join(" ");
    let intersection = join(set_a.intersection(&set_b).copied().collect());
    let diff_ab = join(set_a.difference(&set_b).copied().collect());
    let diff_ba = join(set_b.difference(&set_a).copied().collect());

    let combine = |base: &str, rest: &str| format!("{} {}", base, rest).trim().to_string();
    let t1 = combine(&intersection, &diff_ab);
    let t2 = combine(&intersection, &diff_ba);

    ratio(&intersection, &t1)
        .max(ratio(&intersection, &t2))
        .max(ratio(&t1, &t2))
}
