pub mod dependency_graph;
