// Route handlers, one file per endpoint.

pub mod text;
pub mod wordcloud;
