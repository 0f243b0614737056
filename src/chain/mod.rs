pub mod subgraph_client;
