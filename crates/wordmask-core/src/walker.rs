//! 文档树遍历与就地打码
//!
//! 设计要点：
//! - 显式工作栈迭代遍历，深层嵌套不受调用栈深度限制。
//! - 子节点逆序入栈，出栈顺序即文档序。
//! - 不透明元素（script/style）整棵跳过，其文本不读不写。
use std::borrow::Cow;

use crate::document::DocumentNode;
use crate::matcher::MatcherSet;

/// 一次遍历的汇总结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkOutcome {
    /// 全部文本叶的命中总数
    pub matched: usize,
    /// 被改写的文本叶数量
    pub masked_nodes: usize,
}

/// 遍历单棵文档树，对每个可见文本叶执行整词打码并就地替换
pub fn walk(root: &mut DocumentNode, matchers: &MatcherSet) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    let mut stack: Vec<&mut DocumentNode> = vec![root];

    while let Some(node) = stack.pop() {
        if node.is_opaque() {
            continue;
        }
        match node {
            DocumentNode::Text { text } => {
                let out = matchers.mask(text);
                outcome.matched += out.hits;
                if let Cow::Owned(masked) = out.text {
                    *text = masked;
                    outcome.masked_nodes += 1;
                }
            }
            DocumentNode::Element { children, .. } => {
                for child in children.iter_mut().rev() {
                    stack.push(child);
                }
            }
        }
    }

    outcome
}

/// 遍历一批子树并累加结果（不去重：重叠批次由调用方避免）
pub fn walk_many<'a, I>(roots: I, matchers: &MatcherSet) -> WalkOutcome
where
    I: IntoIterator<Item = &'a mut DocumentNode>,
{
    let mut total = WalkOutcome::default();
    for root in roots {
        let out = walk(root, matchers);
        total.matched += out.matched;
        total.masked_nodes += out.masked_nodes;
    }
    total
}
