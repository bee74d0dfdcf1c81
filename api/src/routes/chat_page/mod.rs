pub mod chat_page_route;
