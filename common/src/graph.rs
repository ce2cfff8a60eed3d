use petgraph::graph::{node_index, UnGraph};

/// Generate a graph corresponding to the dual mesh of a mesh generated from triangulating a grid
///
/// For example, the triangle grid:
/// / -------------------
/// / |A/|C/|E/|G/|I/|K/|
/// / |/B|/D|/F|/H|/J|/L|
/// / -------------------
/// / |M/|O/|Q/|S/|U/|W/|
/// / |/N|/P|/R|/T|/V|/X|
/// / -------------------
///
/// Will have a graph with node Q connecting to R, P, and F
///
/// On an n by m grid, each row has n triangles, and triangle i, j will connect to
/// - (i-1, j).
/// - (i+1,j).
/// - if i even to (i+1,j+1).
/// - else if i odd to (i-1, j-1).
///
pub fn generate_triangle_plane_weighted<const N: usize, const M: usize, E>(
    f: impl Fn(usize, usize) -> E,
) -> UnGraph<(), E> {
    let mut graph = UnGraph::with_capacity(N * M, N * M * 3);

    let mut nodes = [[node_index(0); N]; M];
    for row in nodes.iter_mut() {
        for node in row.iter_mut() {
            *node = graph.add_node(());
        }
    }

    for m in 0..M {
        for n in 0..N {
            let a = nodes[m][n];

            if n < N - 1 {
                let b = nodes[m][n + 1];
                graph.update_edge(a, b, f(a.index(), b.index()));

                if m < M - 1 && n % 2 == 0 {
                    let below = nodes[m + 1][n + 1];
                    graph.update_edge(a, below, f(a.index(), below.index()));
                }
            }
        }
    }

    graph
}

pub fn generate_triangle_plane<const N: usize, const M: usize>() -> UnGraph<(), u32> {
    generate_triangle_plane_weighted::<N, M, _>(|_, _| 1)
}

/// Two disjoint triangle planes in one graph, for exercising disconnected input.
pub fn generate_split_triangle_plane<const N: usize, const M: usize>() -> UnGraph<(), u32> {
    let mut graph = generate_triangle_plane::<N, M>();
    let half = generate_triangle_plane::<N, M>();
    let offset = graph.node_count();

    for _ in half.node_indices() {
        graph.add_node(());
    }
    for edge in half.raw_edges() {
        graph.add_edge(
            node_index(edge.source().index() + offset),
            node_index(edge.target().index() + offset),
            edge.weight,
        );
    }
    graph
}

pub fn graph_contiguous<V, E>(graph: &UnGraph<V, E>) -> bool {
    if graph.node_count() == 0 {
        return true;
    }

    let mut search = vec![0];
    let mut seen = vec![false; graph.node_count()];

    while let Some(next) = search.pop() {
        seen[next] = true;

        for n in graph.neighbors(node_index(next)) {
            if !seen[n.index()] {
                search.push(n.index())
            }
        }
    }

    seen.iter().all(|&x| x)
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_contiguous_graph() {
        let mut g = UnGraph::new_undirected();

        let a = g.add_node(());
        let b = g.add_node(());

        g.add_edge(a, b, ());

        assert!(graph_contiguous(&g));
    }

    #[test]
    fn test_contiguous_empty_graph() {
        let g: UnGraph<(), ()> = UnGraph::new_undirected();

        assert!(graph_contiguous(&g));
    }

    #[test]
    fn test_non_contiguous_graph() {
        let mut g = UnGraph::new_undirected();

        let a = g.add_node(());
        let b = g.add_node(());
        g.add_node(());

        g.add_edge(a, b, ());

        assert!(!graph_contiguous(&g));
    }

    #[test]
    fn test_triangle_plane() {
        let g = generate_triangle_plane::<4, 3>();

        assert_eq!(g.node_count(), 12);
        // 3 edges along each row, 2 diagonals between each pair of rows
        assert_eq!(g.edge_count(), 3 * 3 + 2 * 2);
        assert!(graph_contiguous(&g));
    }

    #[test]
    fn test_split_plane() {
        let g = generate_split_triangle_plane::<4, 4>();

        assert_eq!(g.node_count(), 32);
        assert!(!graph_contiguous(&g));
    }
}
