// arena indices: everything in the automaton is stored in Vecs and referred to
// by a typed u32 index instead of a reference
#[macro_export]
macro_rules! make_type_idx {
    ($vis:vis $type_idx_name:ident, $type_name:ty) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $type_idx_name(u32);

        impl $type_idx_name {
            #[allow(dead_code)]
            $vis fn new(index: usize) -> $type_idx_name {
                $type_idx_name(index as u32)
            }

            #[allow(dead_code)]
            $vis fn index(self) -> usize {
                self.0 as usize
            }

            #[allow(dead_code)]
            $vis fn from_push(vec: &mut Vec<$type_name>, val: $type_name) -> $type_idx_name {
                let idx = $type_idx_name(vec.len() as u32);
                vec.push(val);
                idx
            }
        }

        impl std::ops::Index<$type_idx_name> for [$type_name] {
            type Output = $type_name;

            fn index(&self, index: $type_idx_name) -> &Self::Output {
                &self[index.0 as usize]
            }
        }

        impl std::ops::IndexMut<$type_idx_name> for [$type_name] {
            fn index_mut(&mut self, index: $type_idx_name) -> &mut Self::Output {
                &mut self[index.0 as usize]
            }
        }

        impl std::ops::Index<$type_idx_name> for Vec<$type_name> {
            type Output = $type_name;

            fn index(&self, index: $type_idx_name) -> &Self::Output {
                &self.as_slice()[index]
            }
        }

        impl std::ops::IndexMut<$type_idx_name> for Vec<$type_name> {
            fn index_mut(&mut self, index: $type_idx_name) -> &mut Self::Output {
                &mut self.as_mut_slice()[index]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    struct Node(&'static str);
    make_type_idx!(NodeIdx, Node);

    #[test]
    fn push_and_index() {
        let mut nodes: Vec<Node> = Vec::new();
        let a = NodeIdx::from_push(&mut nodes, Node("a"));
        let b = NodeIdx::from_push(&mut nodes, Node("b"));

        assert_eq!(a.index(), 0);
        assert_eq!(b, NodeIdx::new(1));
        assert_eq!(nodes[b].0, "b");
        nodes[a] = Node("c");
        assert_eq!(nodes[a].0, "c");
    }
}
