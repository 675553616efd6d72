mod export_test;
mod mysql_test;
mod pipeline_test;
mod transfer_test;
