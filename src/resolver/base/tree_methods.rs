// Tree navigation methods for SourceUnit

use super::source_unit::SourceUnit;
use tree_sitter::Node;

impl SourceUnit {
    /// Find nodes by type, in pre-order (document order)
    pub fn find_nodes_by_type<'a>(&self, node: &Node<'a>, node_type: &str) -> Vec<Node<'a>> {
        let mut nodes = Vec::new();
        self.find_nodes_by_type_recursive(node, node_type, &mut nodes);
        nodes
    }

    #[allow(clippy::only_used_in_recursion)] // &self used in recursive calls
    fn find_nodes_by_type_recursive<'a>(
        &self,
        node: &Node<'a>,
        node_type: &str,
        nodes: &mut Vec<Node<'a>>,
    ) {
        if node.kind() == node_type {
            nodes.push(*node);
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.find_nodes_by_type_recursive(&child, node_type, nodes);
        }
    }

    /// First direct child of the given type
    pub fn find_child_by_type<'a>(&self, node: &Node<'a>, child_type: &str) -> Option<Node<'a>> {
        let mut cursor = node.walk();
        let found = node
            .children(&mut cursor)
            .find(|child| child.kind() == child_type);
        found
    }

    /// Direct named children of the given type
    pub fn get_children_of_type<'a>(&self, node: &Node<'a>, child_type: &str) -> Vec<Node<'a>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| child.kind() == child_type)
            .collect()
    }

    /// Get field text safely
    pub fn get_field_text(&self, node: &Node, field_name: &str) -> Option<&str> {
        node.child_by_field_name(field_name)
            .map(|field_node| self.node_text(&field_node))
    }
}
