pub mod accessibility;
pub mod centrality;
pub mod domains;
