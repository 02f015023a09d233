//! Chapter tree stored as a flat arena.
//!
//! Chapters live in a single `Vec` and refer to each other by [`ChapterId`]
//! index. A chapter can only be attached below a chapter that already exists,
//! so the tree is acyclic by construction and copying it is a flat clone.

/// Index of a chapter within its [`ChapterTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChapterId(pub u32);

/// Access flags carried by a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChapterFlags {
    pub free: bool,
    pub locked: bool,
    pub visible: bool,
    pub supplement: bool,
}

impl Default for ChapterFlags {
    fn default() -> Self {
        Self {
            free: false,
            locked: false,
            visible: true,
            supplement: false,
        }
    }
}

/// A chapter in the tree.
///
/// `parent` is an informational back-link; ownership of every chapter stays
/// with the arena.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub flags: ChapterFlags,
    parent: Option<ChapterId>,
    children: Vec<ChapterId>,
}

impl Chapter {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_flags(mut self, flags: ChapterFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn parent(&self) -> Option<ChapterId> {
        self.parent
    }

    pub fn children(&self) -> &[ChapterId] {
        &self.children
    }
}

/// Flat arena of chapters plus the ordered list of top-level chapters.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "Vec<ChapterNode>", into = "Vec<ChapterNode>")
)]
pub struct ChapterTree {
    chapters: Vec<Chapter>,
    roots: Vec<ChapterId>,
}

impl ChapterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a top-level chapter.
    pub fn push_root(&mut self, chapter: Chapter) -> ChapterId {
        let id = self.alloc(chapter, None);
        self.roots.push(id);
        id
    }

    /// Append a chapter as the last child of `parent`.
    ///
    /// Returns `None` (and stores nothing) if `parent` is not in this tree.
    pub fn push_child(&mut self, parent: ChapterId, chapter: Chapter) -> Option<ChapterId> {
        if self.get(parent).is_none() {
            return None;
        }
        let id = self.alloc(chapter, Some(parent));
        if let Some(parent_chapter) = self.chapters.get_mut(parent.0 as usize) {
            parent_chapter.children.push(id);
        }
        Some(id)
    }

    fn alloc(&mut self, mut chapter: Chapter, parent: Option<ChapterId>) -> ChapterId {
        let id = ChapterId(self.chapters.len() as u32);
        chapter.parent = parent;
        chapter.children.clear();
        self.chapters.push(chapter);
        id
    }

    pub fn get(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.get(id.0 as usize)
    }

    /// Mutable access to a chapter's public fields. Tree links stay private.
    pub fn get_mut(&mut self, id: ChapterId) -> Option<&mut Chapter> {
        self.chapters.get_mut(id.0 as usize)
    }

    pub fn roots(&self) -> &[ChapterId] {
        &self.roots
    }

    pub fn children(&self, id: ChapterId) -> &[ChapterId] {
        self.get(id).map(|c| c.children.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Iterate over chapters in arena (insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = (ChapterId, &Chapter)> {
        self.chapters
            .iter()
            .enumerate()
            .map(|(i, c)| (ChapterId(i as u32), c))
    }

    /// Iterate over chapters depth-first in reading order.
    pub fn iter_dfs(&self) -> DfsIter<'_> {
        let mut stack = self.roots.clone();
        stack.reverse();
        DfsIter { tree: self, stack }
    }

    /// Depth-first iteration that also yields each chapter's locator, built
    /// from its parent's as the walk descends.
    pub fn iter_dfs_located(&self) -> LocatedDfsIter<'_> {
        let stack = self
            .roots
            .iter()
            .enumerate()
            .rev()
            .map(|(i, &id)| (id, format!("chapters[{i}]")))
            .collect();
        LocatedDfsIter { tree: self, stack }
    }

    /// Number of ancestors above `id` (0 for a top-level chapter).
    pub fn depth(&self, id: ChapterId) -> usize {
        let mut depth = 0;
        let mut current = self.get(id).and_then(|c| c.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.get(parent).and_then(|c| c.parent);
        }
        depth
    }

    /// Path-like locator such as `chapters[1].children[0]`.
    ///
    /// Walks up through the ancestors; use [`ChapterTree::iter_dfs_located`]
    /// to visit every chapter.
    pub fn locator(&self, id: ChapterId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let parent = self.get(node).and_then(|c| c.parent);
            let siblings = match parent {
                Some(p) => self.children(p),
                None => self.roots(),
            };
            let index = siblings.iter().position(|&s| s == node).unwrap_or(0);
            segments.push(index);
            current = parent;
        }

        let mut out = String::from("chapters");
        for (i, index) in segments.iter().rev().enumerate() {
            if i > 0 {
                out.push_str(".children");
            }
            out.push_str(&format!("[{index}]"));
        }
        out
    }

    /// Build a tree from nested nodes, preserving order.
    pub fn from_nodes(nodes: Vec<ChapterNode>) -> Self {
        let mut tree = Self::new();
        // (parent, node) pairs, reversed so pops come out in order
        let mut pending: Vec<(Option<ChapterId>, ChapterNode)> =
            nodes.into_iter().rev().map(|n| (None, n)).collect();

        while let Some((parent, node)) = pending.pop() {
            let ChapterNode {
                id,
                title,
                flags,
                children,
            } = node;
            let chapter = Chapter::new(id, title).with_flags(flags);
            let new_id = match parent {
                Some(p) => tree.push_child(p, chapter),
                None => Some(tree.push_root(chapter)),
            };
            if let Some(new_id) = new_id {
                pending.extend(children.into_iter().rev().map(|c| (Some(new_id), c)));
            }
        }
        tree
    }

    /// Convert back into nested nodes.
    pub fn to_nodes(&self) -> Vec<ChapterNode> {
        self.roots.iter().map(|&id| self.node_at(id)).collect()
    }

    fn node_at(&self, id: ChapterId) -> ChapterNode {
        let chapter = &self.chapters[id.0 as usize];
        ChapterNode {
            id: chapter.id.clone(),
            title: chapter.title.clone(),
            flags: chapter.flags,
            children: chapter
                .children
                .iter()
                .map(|&child| self.node_at(child))
                .collect(),
        }
    }
}

/// Nested chapter description, as produced by decoders and builders.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChapterNode {
    pub id: String,
    pub title: String,
    pub flags: ChapterFlags,
    pub children: Vec<ChapterNode>,
}

impl ChapterNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: ChapterNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_flags(mut self, flags: ChapterFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl From<Vec<ChapterNode>> for ChapterTree {
    fn from(nodes: Vec<ChapterNode>) -> Self {
        Self::from_nodes(nodes)
    }
}

impl From<ChapterTree> for Vec<ChapterNode> {
    fn from(tree: ChapterTree) -> Self {
        tree.to_nodes()
    }
}

/// Depth-first iterator over chapter ids.
pub struct DfsIter<'a> {
    tree: &'a ChapterTree,
    stack: Vec<ChapterId>,
}

impl Iterator for DfsIter<'_> {
    type Item = ChapterId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order so they're visited left-to-right
        self.stack
            .extend(self.tree.children(current).iter().rev().copied());
        Some(current)
    }
}

/// Depth-first iterator over chapter ids and their locators.
pub struct LocatedDfsIter<'a> {
    tree: &'a ChapterTree,
    stack: Vec<(ChapterId, String)>,
}

impl Iterator for LocatedDfsIter<'_> {
    type Item = (ChapterId, String);

    fn next(&mut self) -> Option<Self::Item> {
        let (current, locator) = self.stack.pop()?;
        let children = self.tree.children(current);
        self.stack.extend(
            children
                .iter()
                .enumerate()
                .rev()
                .map(|(i, &child)| (child, format!("{locator}.children[{i}]"))),
        );
        Some((current, locator))
    }
}
